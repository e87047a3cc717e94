//! `localStorage`-backed session store

use lib_connect::SessionStore;
use web_sys::Storage;

/// Session store over `window.localStorage`.
///
/// Without storage (privacy mode, sandboxed iframe) reads return nothing and writes
/// are dropped, so the page still works, just without resume.
pub struct LocalSessionStore {
    storage: Option<Storage>,
}

impl LocalSessionStore {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("[Storage] localStorage unavailable, session will not persist");
        }
        Self { storage }
    }
}

impl SessionStore for LocalSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if let Err(err) = storage.set_item(key, value) {
                log::error!("[Storage] Failed to write {}: {:?}", key, err);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            if let Err(err) = storage.remove_item(key) {
                log::error!("[Storage] Failed to remove {}: {:?}", key, err);
            }
        }
    }
}
