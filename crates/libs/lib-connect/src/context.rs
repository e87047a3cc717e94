//! # Connect Context
//!
//! One per application instance: owns the configuration, the provider registry, and
//! the controller, and wires discovery into them.

use std::rc::Rc;

use crate::config::ConnectConfig;
use crate::controller::{ConnectionController, ResumeOutcome};
use crate::discovery::{DiscoveryPort, ProviderRegistry};
use crate::error::ConfigError;
use crate::identity::{IdentityResolver, NameService};
use crate::session::SessionStore;
use crate::spawn::Spawner;

pub struct ConnectContext {
    config: ConnectConfig,
    providers: ProviderRegistry,
    controller: ConnectionController,
}

impl ConnectContext {
    /// Validate `config` and build the registries and controller.
    ///
    /// `names` is the backend for identity lookups; `None` disables them.
    pub fn new(
        config: ConnectConfig,
        store: Rc<dyn SessionStore>,
        spawner: Rc<dyn Spawner>,
        names: Option<Rc<dyn NameService>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let chains = config.chain_registry()?;
        let providers = ProviderRegistry::new();
        let controller = ConnectionController::new(
            chains,
            providers.clone(),
            store,
            spawner,
            names.map(IdentityResolver::new),
        );

        Ok(Self {
            config,
            providers,
            controller,
        })
    }

    /// Listen for announcements, ask wallets to announce, then resume the persisted
    /// session.
    pub fn start(&self, port: &dyn DiscoveryPort) -> ResumeOutcome {
        let controller = self.controller.clone();
        let auto_reconnect = self.config.auto_reconnect;
        self.providers.listen(port, move |handle| {
            if auto_reconnect {
                controller.reconnect_if_dormant(handle);
            }
        });
        self.providers.request_discovery(port);

        let outcome = self.controller.resume();
        tracing::info!(providers = self.providers.len(), ?outcome, "connect context started");
        outcome
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn controller(&self) -> &ConnectionController {
        &self.controller
    }
}
