//! # Provider Discovery
//!
//! EIP-6963 style discovery: the page broadcasts a request, any number of wallets
//! answer with an announcement, at any time and as often as they like.
//!
//! The [`DiscoveryPort`] abstracts the broadcast channel (window events in the
//! browser, a fake in tests). The [`ProviderRegistry`] collects announcements,
//! deduplicated by display name with the first announcement winning, so the final
//! provider set does not depend on arrival order.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::provider::{Eip1193Provider, ProviderHandle, ProviderInfo};

/// One answer to a discovery request.
#[derive(Clone)]
pub struct ProviderAnnouncement {
    pub info: ProviderInfo,
    pub provider: Rc<dyn Eip1193Provider>,
}

impl From<ProviderAnnouncement> for ProviderHandle {
    fn from(announcement: ProviderAnnouncement) -> Self {
        ProviderHandle::new(announcement.info, announcement.provider)
    }
}

pub type AnnouncementListener = Rc<dyn Fn(ProviderAnnouncement)>;

/// Publish/subscribe channel carrying discovery requests and announcements.
pub trait DiscoveryPort {
    /// Deliver every future announcement to `listener`.
    fn subscribe(&self, listener: AnnouncementListener);

    /// Broadcast a discovery request.
    fn request_providers(&self);
}

/// Announced providers, insertion-ordered and deduplicated by name.
///
/// Cloning shares the underlying list.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Rc<RefCell<Vec<ProviderHandle>>>,
    discovery_requested: Rc<Cell<bool>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider unless one with the same name is already registered.
    ///
    /// Returns `true` when the handle was added.
    pub fn announce(&self, handle: ProviderHandle) -> bool {
        let mut providers = self.providers.borrow_mut();
        if providers.iter().any(|p| p.name() == handle.name()) {
            tracing::trace!(provider = handle.name(), "duplicate provider announcement ignored");
            return false;
        }

        tracing::debug!(provider = handle.name(), "provider announced");
        providers.push(handle);
        true
    }

    /// Feed every announcement arriving on `port` into the registry.
    ///
    /// `on_added` runs for newly added providers only, after the registry has been
    /// updated and released.
    pub fn listen<F>(&self, port: &dyn DiscoveryPort, on_added: F)
    where
        F: Fn(&ProviderHandle) + 'static,
    {
        let registry = self.clone();
        port.subscribe(Rc::new(move |announcement: ProviderAnnouncement| {
            let handle = ProviderHandle::from(announcement);
            if registry.announce(handle.clone()) {
                on_added(&handle);
            }
        }));
    }

    /// Broadcast the discovery request. Only the first call per registry broadcasts.
    pub fn request_discovery(&self, port: &dyn DiscoveryPort) {
        if self.discovery_requested.replace(true) {
            return;
        }
        tracing::debug!("requesting provider announcements");
        port.request_providers();
    }

    pub fn get(&self, name: &str) -> Option<ProviderHandle> {
        self.providers
            .borrow()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Snapshot of the registered providers in announcement order.
    pub fn list(&self) -> Vec<ProviderHandle> {
        self.providers.borrow().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers
            .borrow()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeDiscovery, FakeProvider};

    #[test]
    fn test_announce_dedups_by_name() {
        let registry = ProviderRegistry::new();
        let first = FakeProvider::new();
        let second = FakeProvider::new();

        assert!(registry.announce(first.handle("Acme")));
        assert!(!registry.announce(second.handle("Acme")));

        assert_eq!(registry.len(), 1);
        let kept = registry.get("Acme").unwrap();
        assert!(kept.same_provider(&first.handle("Acme")));
    }

    #[test]
    fn test_list_is_insertion_ordered() {
        let registry = ProviderRegistry::new();
        for name in ["Zeta", "Acme", "Mid", "Acme", "Zeta"] {
            registry.announce(FakeProvider::new().handle(name));
        }
        assert_eq!(registry.names(), vec!["Zeta", "Acme", "Mid"]);
        assert!(registry.get("Missing").is_none());
    }

    #[test]
    fn test_listen_reports_new_providers_only() {
        let registry = ProviderRegistry::new();
        let port = FakeDiscovery::new();
        let added = Rc::new(RefCell::new(Vec::new()));

        let sink = added.clone();
        registry.listen(&port, move |handle| sink.borrow_mut().push(handle.name().to_string()));

        port.announce("Acme", FakeProvider::new());
        port.announce("Acme", FakeProvider::new());
        port.announce("Other", FakeProvider::new());

        assert_eq!(*added.borrow(), vec!["Acme", "Other"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_discovery_requested_once() {
        let registry = ProviderRegistry::new();
        let port = FakeDiscovery::new();

        registry.request_discovery(&port);
        registry.request_discovery(&port);

        assert_eq!(port.request_count(), 1);
    }
}
