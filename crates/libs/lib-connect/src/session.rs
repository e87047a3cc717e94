//! # Persisted Session
//!
//! The session survives page reloads in a synchronous key/value store
//! (`localStorage` in the browser) under three keys. Only the controller writes it,
//! and every write replaces all three fields so a crash between writes cannot leave
//! a mix of old and new values.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const CONNECTED_KEY: &str = "connectConnected";
pub const LAST_PROVIDER_KEY: &str = "connectLastWallet";
pub const CHAIN_ID_KEY: &str = "connectCurrentChainId";

/// Synchronous key/value storage, last write wins.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// The persisted session record. Stale by nature: the named provider may not have
/// announced yet, or may never announce again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub connected: bool,
    pub last_provider_name: Option<String>,
    pub current_chain_id: Option<String>,
}

impl SessionState {
    /// A cleared session that only remembers which chain to show.
    pub fn idle(chain_id: Option<String>) -> Self {
        Self {
            connected: false,
            last_provider_name: None,
            current_chain_id: chain_id,
        }
    }

    pub fn load(store: &dyn SessionStore) -> Self {
        Self {
            connected: store.get(CONNECTED_KEY).as_deref() == Some("true"),
            last_provider_name: store.get(LAST_PROVIDER_KEY).filter(|name| !name.is_empty()),
            current_chain_id: store.get(CHAIN_ID_KEY).filter(|id| !id.is_empty()),
        }
    }

    /// Write all three fields; `false`/`None` remove their key.
    pub fn save(&self, store: &dyn SessionStore) {
        if self.connected {
            store.set(CONNECTED_KEY, "true");
        } else {
            store.remove(CONNECTED_KEY);
        }
        write_optional(store, LAST_PROVIDER_KEY, self.last_provider_name.as_deref());
        write_optional(store, CHAIN_ID_KEY, self.current_chain_id.as_deref());
    }

    pub fn clear(store: &dyn SessionStore) {
        SessionState::default().save(store);
    }

    /// Connected to `provider_name` but the provider is not attached (yet).
    pub fn names_provider(&self, provider_name: &str) -> bool {
        self.connected && self.last_provider_name.as_deref() == Some(provider_name)
    }
}

fn write_optional(store: &dyn SessionStore, key: &str, value: Option<&str>) {
    match value {
        Some(value) => store.set(key, value),
        None => store.remove(key),
    }
}

/// In-memory [`SessionStore`], for tests and non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: &SessionState) -> Self {
        let store = Self::new();
        session.save(&store);
        store
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}
