//! # Connection Controller
//!
//! The session state machine: `Idle → Connecting → Connected → Idle`.
//!
//! ## Responsibilities
//!
//! - **Handshake**: `eth_requestAccounts` + `eth_chainId` issued together; both must
//!   succeed before anything is persisted, subscribed or reported
//! - **Subscriptions**: at most one provider has live listeners. Detaching the old
//!   provider and attaching the new one happen in one synchronous step
//! - **Chain tracking**: normalization and allow-list checks through the
//!   [`ChainRegistry`]
//! - **Persistence**: every write to the [`SessionStore`] replaces all fields
//! - **Resume**: re-attach to the persisted provider without a new handshake
//! - **Identity**: spawn the [`IdentityResolver`] after an account becomes known,
//!   never awaiting it
//!
//! ## Ownership
//!
//! The controller is a cheap `Rc` handle. Provider listeners hold a `Weak`
//! reference, so a provider that outlives the controller does not keep it alive.
//! No `RefCell` borrow is held across an `.await` or while a host callback runs.


use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::future::try_join;
use serde_json::Value;
use shared::{AccountsChangedEvent, ChainChangeEvent, ConnectEvent};

use crate::chain::{to_hex, ChainDescriptor, ChainIdentifier, ChainRegistry};
use crate::discovery::ProviderRegistry;
use crate::error::{ConnectError, Result};
use crate::events::{dispatch, Callbacks};
use crate::identity::IdentityResolver;
use crate::provider::{Capability, EventListener, ProviderEvent, ProviderHandle, ProviderRequest};
use crate::session::{SessionState, SessionStore};
use crate::spawn::Spawner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Connected,
}

/// The provider currently driving the session.
#[derive(Debug, Clone)]
pub struct ActiveConnection {
    pub provider: ProviderHandle,
    /// `None` after a resume until the provider reports its accounts.
    pub account: Option<String>,
    /// Chain id as the wallet reported it.
    pub chain_id: String,
}

/// Result of a successful `connect()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub accounts: Vec<String>,
    pub chain_id: String,
    pub provider_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Nothing persisted, or the persisted session is not connected.
    NoSession,
    /// Listeners re-attached to the persisted provider.
    Resumed { provider_name: String },
    /// Persisted as connected, but the provider has not announced.
    Dormant { provider_name: String },
}

#[derive(Clone)]
pub struct ConnectionController {
    inner: Rc<Inner>,
}

struct Inner {
    chains: ChainRegistry,
    providers: ProviderRegistry,
    store: Rc<dyn SessionStore>,
    spawner: Rc<dyn Spawner>,
    identity: Option<IdentityResolver>,
    callbacks: RefCell<Callbacks>,
    active: RefCell<Option<ActiveConnection>>,
    /// Providers with a handshake in flight, tagged with the session epoch it started in.
    connecting: RefCell<Vec<(String, u64)>>,
    /// Provider whose listeners are live.
    subscribed: RefCell<Option<ProviderHandle>>,
    /// Bumped on every detach; listeners only act while their value is current.
    subscription_epoch: Cell<u64>,
    /// Bumped by disconnects; handshakes started under an older value are discarded.
    session_epoch: Cell<u64>,
    disconnecting: Cell<bool>,
    resumed: Cell<bool>,
}

impl ConnectionController {
    pub fn new(
        chains: ChainRegistry,
        providers: ProviderRegistry,
        store: Rc<dyn SessionStore>,
        spawner: Rc<dyn Spawner>,
        identity: Option<IdentityResolver>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                chains,
                providers,
                store,
                spawner,
                identity,
                callbacks: RefCell::new(Callbacks::default()),
                active: RefCell::new(None),
                connecting: RefCell::new(Vec::new()),
                subscribed: RefCell::new(None),
                subscription_epoch: Cell::new(0),
                session_epoch: Cell::new(0),
                disconnecting: Cell::new(false),
                resumed: Cell::new(false),
            }),
        }
    }

    // region:    --- Operations

    /// Connect to an announced provider.
    ///
    /// Returns `Ok(None)` when the provider has not announced or a handshake with it
    /// is already in flight. On error nothing is persisted, no listener is attached
    /// and a previous connection stays as it was.
    pub async fn connect(&self, provider_name: &str) -> Result<Option<Connection>> {
        let Some(handle) = self.inner.providers.get(provider_name) else {
            tracing::debug!(provider = provider_name, "connect requested for a provider that has not announced");
            return Ok(None);
        };

        let epoch = self.inner.session_epoch.get();
        {
            let mut connecting = self.inner.connecting.borrow_mut();
            if connecting.iter().any(|(name, _)| name == provider_name) {
                tracing::debug!(provider = provider_name, "handshake already in flight");
                return Ok(None);
            }
            connecting.push((provider_name.to_string(), epoch));
        }

        tracing::info!(provider = provider_name, "connecting");

        let provider = handle.provider().clone();
        let handshake = try_join(
            provider.request(&ProviderRequest::RequestAccounts),
            provider.request(&ProviderRequest::ChainId),
        )
        .await;

        self.finish_connecting(provider_name, epoch);

        let (accounts, chain_id) = match handshake {
            Ok(responses) => responses,
            Err(err) => {
                tracing::error!(provider = provider_name, error = %err, "Connection failed");
                return Err(err.into());
            }
        };
        let accounts = parse_accounts(&accounts)?;
        let chain_id = parse_chain_id(&chain_id)?;

        if self.inner.session_epoch.get() != epoch {
            tracing::warn!(provider = provider_name, "disconnect during handshake, discarding result");
            return Err(ConnectError::Superseded);
        }

        self.commit_connection(handle, &accounts, &chain_id);

        Ok(Some(Connection {
            accounts,
            chain_id,
            provider_name: provider_name.to_string(),
        }))
    }

    /// End the session.
    ///
    /// The remote permission revoke is best effort; the local session is always
    /// cleared and `on_disconnect` always fires.
    pub async fn disconnect(&self) {
        if self.inner.disconnecting.replace(true) {
            tracing::debug!("disconnect already in progress");
            return;
        }

        let provider = self.connected_provider();

        // Listeners go first: the revoke itself makes wallets emit accountsChanged([]).
        self.detach();
        self.bump_session_epoch();

        let revoke = match &provider {
            Some(handle) => Capability::from_result(
                handle
                    .provider()
                    .request(&ProviderRequest::RevokePermissions)
                    .await
                    .map(|_| ()),
            ),
            None => Capability::Unsupported,
        };
        match revoke {
            Capability::Succeeded(()) => tracing::debug!("permissions revoked"),
            Capability::Unsupported => tracing::debug!("provider cannot revoke permissions"),
            Capability::Failed(err) => tracing::error!(error = %err, "Disconnect failed, clearing local session anyway"),
        }

        // A handshake may have committed while the revoke was pending.
        self.detach();
        self.bump_session_epoch();

        *self.inner.active.borrow_mut() = None;
        self.inner.connecting.borrow_mut().clear();
        SessionState::idle(Some(self.inner.chains.default_chain().hex_id.clone()))
            .save(&*self.inner.store);
        self.inner.disconnecting.set(false);

        tracing::info!(
            provider = provider.as_ref().map(|p| p.name()).unwrap_or("<none>"),
            "disconnected"
        );
        self.notify_disconnect();
    }

    /// Ask the connected wallet to switch to `network`.
    ///
    /// No-op without a connected provider. On error nothing changes.
    pub async fn switch_network(&self, network: &ChainDescriptor) -> Result<()> {
        let Some(handle) = self.connected_provider() else {
            tracing::debug!(chain = %network.hex_id, "switch requested without a connected provider");
            return Ok(());
        };

        let request = ProviderRequest::SwitchChain {
            chain_id_hex: network.hex_id.clone(),
        };
        if let Err(err) = handle.provider().request(&request).await {
            tracing::error!(chain = %network.hex_id, error = %err, "Network switch failed");
            return Err(err.into());
        }

        self.persist_chain(&network.hex_id, network.allowed);
        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.chain_id = network.hex_id.clone();
        }
        tracing::info!(chain = %network.hex_id, name = %network.name, "network switched");
        Ok(())
    }

    /// [`ConnectionController::switch_network`] by network key. Unknown keys are a no-op.
    pub async fn switch_to(&self, network_key: &str) -> Result<()> {
        let Some(network) = self.inner.chains.get(network_key).cloned() else {
            tracing::debug!(network = network_key, "unknown network key");
            return Ok(());
        };
        self.switch_network(&network).await
    }

    /// Restore the persisted session without a handshake.
    ///
    /// Call once at startup, after providers had a chance to announce.
    pub fn resume(&self) -> ResumeOutcome {
        self.inner.resumed.set(true);

        let mut session = SessionState::load(&*self.inner.store);
        let chain_id = session
            .current_chain_id
            .clone()
            .unwrap_or_else(|| self.inner.chains.default_chain().hex_id.clone());
        session.current_chain_id = self
            .inner
            .chains
            .is_allowed(&chain_id)
            .then(|| chain_id.clone());
        session.save(&*self.inner.store);

        let provider_name = match (session.connected, session.last_provider_name) {
            (true, Some(name)) => name,
            _ => return ResumeOutcome::NoSession,
        };

        let Some(handle) = self.inner.providers.get(&provider_name) else {
            tracing::info!(provider = %provider_name, "persisted provider has not announced, session dormant");
            return ResumeOutcome::Dormant { provider_name };
        };

        let already_attached = self
            .inner
            .subscribed
            .borrow()
            .as_ref()
            .is_some_and(|current| current.same_provider(&handle));
        if !already_attached {
            self.attach(&handle);
            *self.inner.active.borrow_mut() = Some(ActiveConnection {
                provider: handle,
                account: None,
                chain_id,
            });
        }

        tracing::info!(provider = %provider_name, "session resumed");
        ResumeOutcome::Resumed { provider_name }
    }

    /// Reconnect when the provider of a dormant session finally announces.
    ///
    /// Only acts after `resume()` ran; announcements before that are resume's job.
    pub fn reconnect_if_dormant(&self, handle: &ProviderHandle) {
        if !self.inner.resumed.get()
            || self.inner.active.borrow().is_some()
            || self.is_connecting()
            || !SessionState::load(&*self.inner.store).names_provider(handle.name())
        {
            return;
        }

        tracing::info!(provider = handle.name(), "dormant session provider announced, reconnecting");
        let controller = self.clone();
        let name = handle.name().to_string();
        self.inner.spawner.spawn(Box::pin(async move {
            if let Err(err) = controller.connect(&name).await {
                tracing::warn!(provider = %name, error = %err, "reconnect failed");
            }
        }));
    }

    /// Clear a session that is persisted as connected but never attached.
    ///
    /// Returns `true` when a dormant session was cleared.
    pub fn expire_dormant_session(&self) -> bool {
        if self.inner.active.borrow().is_some() || self.is_connecting() {
            return false;
        }
        let session = SessionState::load(&*self.inner.store);
        if !session.connected {
            return false;
        }

        tracing::info!(
            provider = session.last_provider_name.as_deref().unwrap_or("<none>"),
            "dormant session expired"
        );
        SessionState::idle(Some(self.inner.chains.default_chain().hex_id.clone()))
            .save(&*self.inner.store);
        self.notify_disconnect();
        true
    }

    /// Current account via `eth_accounts` (never prompts).
    pub async fn refresh_account(&self) -> Option<String> {
        let handle = self.connected_provider()?;
        let response = match handle.provider().request(&ProviderRequest::Accounts).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "Failed to get account");
                return None;
            }
        };
        let accounts = match parse_accounts(&response) {
            Ok(accounts) => accounts,
            Err(err) => {
                tracing::error!(error = %err, "Failed to get account");
                return None;
            }
        };

        let account = accounts.first().cloned()?;
        let updated = match self.inner.active.borrow_mut().as_mut() {
            Some(active) if active.provider.same_provider(&handle) => {
                active.account = Some(account.clone());
                true
            }
            _ => false,
        };
        if updated {
            self.spawn_identity(account.clone());
        }
        Some(account)
    }

    /// Current chain via `eth_chainId`.
    pub async fn query_chain_id(&self) -> Option<String> {
        let handle = self.connected_provider()?;
        match handle.provider().request(&ProviderRequest::ChainId).await {
            Ok(response) => parse_chain_id(&response)
                .map_err(|err| tracing::error!(error = %err, "Failed to get chain ID"))
                .ok(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to get chain ID");
                None
            }
        }
    }

    // endregion: --- Operations

    // region:    --- Accessors

    pub fn phase(&self) -> ConnectionPhase {
        if self.is_connecting() {
            ConnectionPhase::Connecting
        } else if self.inner.active.borrow().is_some() {
            ConnectionPhase::Connected
        } else {
            ConnectionPhase::Idle
        }
    }

    pub fn active(&self) -> Option<ActiveConnection> {
        self.inner.active.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.active.borrow().is_some()
    }

    pub fn account(&self) -> Option<String> {
        self.inner
            .active
            .borrow()
            .as_ref()
            .and_then(|active| active.account.clone())
    }

    /// Active chain id, else the persisted one.
    pub fn chain_id(&self) -> Option<String> {
        if let Some(active) = self.inner.active.borrow().as_ref() {
            return Some(active.chain_id.clone());
        }
        SessionState::load(&*self.inner.store).current_chain_id
    }

    pub fn session(&self) -> SessionState {
        SessionState::load(&*self.inner.store)
    }

    /// The active provider, else the announced provider named by the persisted session.
    pub fn connected_provider(&self) -> Option<ProviderHandle> {
        if let Some(active) = self.inner.active.borrow().as_ref() {
            return Some(active.provider.clone());
        }
        let name = SessionState::load(&*self.inner.store).last_provider_name?;
        self.inner.providers.get(&name)
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.inner.chains
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.inner.providers
    }

    // endregion: --- Accessors

    // region:    --- Host callbacks

    pub fn on_connect(&self, handler: impl Fn(&ConnectEvent) + 'static) {
        self.inner.callbacks.borrow_mut().set_on_connect(handler);
    }

    pub fn on_disconnect(&self, handler: impl Fn() + 'static) {
        self.inner.callbacks.borrow_mut().set_on_disconnect(handler);
    }

    pub fn on_chain_change(&self, handler: impl Fn(&ChainChangeEvent) + 'static) {
        self.inner.callbacks.borrow_mut().set_on_chain_change(handler);
    }

    pub fn on_accounts_changed(&self, handler: impl Fn(&AccountsChangedEvent) + 'static) {
        self.inner.callbacks.borrow_mut().set_on_accounts_changed(handler);
    }

    pub fn on_identity(&self, handler: impl Fn(&shared::IdentityEvent) + 'static) {
        self.inner.callbacks.borrow_mut().set_on_identity(handler);
    }

    // endregion: --- Host callbacks

    // region:    --- Internals

    fn is_connecting(&self) -> bool {
        !self.inner.connecting.borrow().is_empty()
    }

    /// Drop the in-flight entry of one handshake. A disconnect may already have
    /// cleared it and a newer handshake with the same provider may have taken its place.
    fn finish_connecting(&self, provider_name: &str, epoch: u64) {
        self.inner
            .connecting
            .borrow_mut()
            .retain(|(name, started)| !(name == provider_name && *started == epoch));
    }

    fn bump_session_epoch(&self) {
        self.inner.session_epoch.set(self.inner.session_epoch.get() + 1);
    }

    /// Persist, subscribe and publish a finished handshake. Runs without suspending.
    fn commit_connection(&self, handle: ProviderHandle, accounts: &[String], chain_id: &str) {
        let provider_name = handle.name().to_string();
        let allowed = self.inner.chains.is_allowed(chain_id);

        SessionState {
            connected: true,
            last_provider_name: Some(provider_name.clone()),
            current_chain_id: allowed.then(|| chain_id.to_string()),
        }
        .save(&*self.inner.store);

        self.attach(&handle);
        *self.inner.active.borrow_mut() = Some(ActiveConnection {
            provider: handle,
            account: accounts.first().cloned(),
            chain_id: chain_id.to_string(),
        });

        tracing::info!(provider = %provider_name, chain_id, allowed, "connected");

        let event = ConnectEvent {
            accounts: accounts.to_vec(),
            chain_id: chain_id.to_string(),
            provider_name,
        };
        let handler = self.inner.callbacks.borrow().connect_handler();
        if let Some(handler) = handler {
            dispatch("connect", || handler(&event));
        }

        if let Some(account) = accounts.first() {
            self.spawn_identity(account.clone());
        }
    }

    /// Replace the live subscription set with one on `handle`.
    fn attach(&self, handle: &ProviderHandle) {
        self.detach();

        let epoch = self.inner.subscription_epoch.get();
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let listener: EventListener = Rc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                ConnectionController { inner }.handle_event(epoch, event);
            }
        });

        match handle.provider().subscribe(listener) {
            Capability::Succeeded(()) => {
                tracing::debug!(provider = handle.name(), "provider events subscribed")
            }
            Capability::Unsupported => {
                tracing::warn!(provider = handle.name(), "provider does not emit events")
            }
            Capability::Failed(err) => {
                tracing::warn!(provider = handle.name(), error = %err, "event subscription failed")
            }
        }
        *self.inner.subscribed.borrow_mut() = Some(handle.clone());
    }

    /// Drop the live subscription set. Stale listeners are also fenced off by epoch,
    /// for providers that cannot remove them.
    fn detach(&self) {
        self.inner
            .subscription_epoch
            .set(self.inner.subscription_epoch.get() + 1);

        let previous = self.inner.subscribed.borrow_mut().take();
        if let Some(previous) = previous {
            match previous.provider().remove_all_listeners() {
                Capability::Succeeded(()) => {
                    tracing::debug!(provider = previous.name(), "provider events unsubscribed")
                }
                Capability::Unsupported => tracing::debug!(
                    provider = previous.name(),
                    "provider cannot remove listeners, relying on epoch fence"
                ),
                Capability::Failed(err) => {
                    tracing::warn!(provider = previous.name(), error = %err, "removing listeners failed")
                }
            }
        }
    }

    fn handle_event(&self, epoch: u64, event: ProviderEvent) {
        if epoch != self.inner.subscription_epoch.get() {
            tracing::trace!(event = event.name(), "event from a detached provider ignored");
            return;
        }

        match event {
            ProviderEvent::AccountsChanged(accounts) => self.handle_accounts_changed(accounts),
            ProviderEvent::ChainChanged(raw) => self.handle_chain_changed(raw),
            ProviderEvent::Disconnected => {
                tracing::info!("provider disconnected");
                self.spawn_disconnect();
            }
        }
    }

    fn handle_accounts_changed(&self, accounts: Vec<String>) {
        let Some(account) = accounts.first().cloned() else {
            tracing::info!("wallet reported no accounts, disconnecting");
            self.spawn_disconnect();
            return;
        };

        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.account = Some(account.clone());
        }
        tracing::debug!(account = %account, "account changed");

        let event = AccountsChangedEvent {
            account: account.clone(),
            accounts,
        };
        let handler = self.inner.callbacks.borrow().accounts_changed_handler();
        if let Some(handler) = handler {
            dispatch("accountsChanged", || handler(&event));
        }

        self.spawn_identity(account);
    }

    fn handle_chain_changed(&self, raw: String) {
        let id = ChainIdentifier::from(raw.as_str());
        let chain_id = match id.normalize() {
            Ok(chain_id) => chain_id,
            Err(err) => {
                tracing::warn!(chain = %raw, error = %err, "ignoring malformed chainChanged");
                return;
            }
        };
        let descriptor = self.inner.chains.describe(id);

        self.persist_chain(&raw, descriptor.allowed);
        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.chain_id = raw.clone();
        }
        tracing::info!(chain_id, name = %descriptor.name, allowed = descriptor.allowed, "chain changed");

        let event = ChainChangeEvent {
            chain_id,
            hex_chain_id: raw,
            name: descriptor.name,
            allowed: descriptor.allowed,
        };
        let handler = self.inner.callbacks.borrow().chain_change_handler();
        if let Some(handler) = handler {
            dispatch("chainChanged", || handler(&event));
        }
    }

    /// Store `chain_id` when allowed, clear it otherwise; other fields are kept.
    fn persist_chain(&self, chain_id: &str, allowed: bool) {
        let mut session = SessionState::load(&*self.inner.store);
        session.current_chain_id = allowed.then(|| chain_id.to_string());
        session.save(&*self.inner.store);
    }

    fn notify_disconnect(&self) {
        let handler = self.inner.callbacks.borrow().disconnect_handler();
        if let Some(handler) = handler {
            dispatch("disconnect", || handler());
        }
    }

    fn spawn_disconnect(&self) {
        let controller = self.clone();
        self.inner.spawner.spawn(Box::pin(async move {
            controller.disconnect().await;
        }));
    }

    fn spawn_identity(&self, account: String) {
        let Some(resolver) = self.inner.identity.clone() else {
            return;
        };
        let weak = Rc::downgrade(&self.inner);

        self.inner.spawner.spawn(Box::pin(async move {
            let Some(identity) = resolver.resolve(&account).await else {
                return;
            };
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let controller = ConnectionController { inner };
            if controller.account().as_deref() != Some(account.as_str()) {
                tracing::debug!(account = %account, "identity resolved for an account no longer active");
                return;
            }

            tracing::debug!(account = %account, name = %identity.name, "identity resolved");
            let event = identity.to_event();
            let handler = controller.inner.callbacks.borrow().identity_handler();
            if let Some(handler) = handler {
                dispatch("identity", || handler(&event));
            }
        }));
    }

    // endregion: --- Internals
}

fn parse_accounts(value: &Value) -> Result<Vec<String>> {
    serde_json::from_value(value.clone())
        .map_err(|e| ConnectError::MalformedResponse(format!("accounts: {e}")))
}

/// The wallet's chain id in hex form. Numeric answers are re-encoded.
fn parse_chain_id(value: &Value) -> Result<String> {
    let id = ChainIdentifier::from_json(value)
        .ok_or_else(|| ConnectError::MalformedResponse(format!("chain id: {value}")))?;
    let numeric = id.normalize()?;
    Ok(match id {
        ChainIdentifier::Text(raw) => raw,
        ChainIdentifier::Numeric(_) => to_hex(numeric),
    })
}
