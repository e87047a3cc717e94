//! Scripted stand-ins for the browser: provider, discovery channel, spawner and
//! name/RPC backends.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use alloy_primitives::Address;
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde_json::{json, Value};

use crate::discovery::{AnnouncementListener, DiscoveryPort, ProviderAnnouncement};
use crate::error::{IdentityError, ProviderError};
use crate::identity::{NameService, RpcTransport};
use crate::provider::{
    Capability, Eip1193Provider, EventListener, ProviderEvent, ProviderHandle, ProviderInfo,
    ProviderRequest,
};
use crate::spawn::Spawner;

pub const ACCOUNT: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
pub const OTHER_ACCOUNT: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";

// region:    --- FakeProvider

type Gate = Shared<oneshot::Receiver<()>>;

struct ProviderState {
    requests: RefCell<Vec<ProviderRequest>>,
    responses: RefCell<HashMap<&'static str, Result<Value, ProviderError>>>,
    listeners: RefCell<Vec<EventListener>>,
    emits_events: Cell<bool>,
    removes_listeners: Cell<bool>,
    gate: RefCell<Option<Gate>>,
}

#[async_trait(?Send)]
impl Eip1193Provider for ProviderState {
    async fn request(&self, request: &ProviderRequest) -> Result<Value, ProviderError> {
        self.requests.borrow_mut().push(request.clone());

        let gate = self.gate.borrow().clone();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let scripted = self.responses.borrow().get(request.method()).cloned();
        scripted.unwrap_or(Ok(Value::Null))
    }

    fn subscribe(&self, listener: EventListener) -> Capability<()> {
        if !self.emits_events.get() {
            return Capability::Unsupported;
        }
        self.listeners.borrow_mut().push(listener);
        Capability::Succeeded(())
    }

    fn remove_all_listeners(&self) -> Capability<()> {
        if !self.removes_listeners.get() {
            return Capability::Unsupported;
        }
        self.listeners.borrow_mut().clear();
        Capability::Succeeded(())
    }
}

/// Scripted EIP-1193 provider. Clones share state.
///
/// Answers the handshake with [`ACCOUNT`] on `0x1` unless told otherwise; every other
/// method answers `null`.
#[derive(Clone)]
pub struct FakeProvider {
    state: Rc<ProviderState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        let provider = Self {
            state: Rc::new(ProviderState {
                requests: RefCell::new(Vec::new()),
                responses: RefCell::new(HashMap::new()),
                listeners: RefCell::new(Vec::new()),
                emits_events: Cell::new(true),
                removes_listeners: Cell::new(true),
                gate: RefCell::new(None),
            }),
        };
        provider.respond("eth_requestAccounts", Ok(json!([ACCOUNT])));
        provider.respond("eth_accounts", Ok(json!([ACCOUNT])));
        provider.respond("eth_chainId", Ok(json!("0x1")));
        provider
    }

    pub fn respond(&self, method: &'static str, response: Result<Value, ProviderError>) {
        self.state.responses.borrow_mut().insert(method, response);
    }

    pub fn with_chain(self, chain_id: &str) -> Self {
        self.respond("eth_chainId", Ok(json!(chain_id)));
        self
    }

    pub fn with_accounts(self, accounts: &[&str]) -> Self {
        self.respond("eth_requestAccounts", Ok(json!(accounts)));
        self.respond("eth_accounts", Ok(json!(accounts)));
        self
    }

    pub fn failing(self, method: &'static str, code: i64) -> Self {
        self.respond(method, Err(ProviderError::new(code, format!("{method} failed"))));
        self
    }

    /// Provider without `on`.
    pub fn without_events(self) -> Self {
        self.state.emits_events.set(false);
        self
    }

    /// Provider without `removeAllListeners`.
    pub fn without_listener_removal(self) -> Self {
        self.state.removes_listeners.set(false);
        self
    }

    /// Hold every request until the returned sender fires or drops.
    pub fn hold_requests(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.state.gate.borrow_mut() = Some(rx.shared());
        tx
    }

    pub fn handle(&self, name: &str) -> ProviderHandle {
        ProviderHandle::new(ProviderInfo::named(name), self.as_provider())
    }

    pub fn as_provider(&self) -> Rc<dyn Eip1193Provider> {
        self.state.clone()
    }

    pub fn emit(&self, event: ProviderEvent) {
        let listeners = self.state.listeners.borrow().clone();
        for listener in listeners {
            listener(event.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.state.requests.borrow().clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.state.requests.borrow().iter().map(|r| r.method()).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state
            .requests
            .borrow()
            .iter()
            .filter(|r| r.method() == method)
            .count()
    }
}

// endregion: --- FakeProvider

// region:    --- FakeDiscovery

/// In-process discovery channel. `respond_with` providers answer every request
/// synchronously, the way injected wallets do.
#[derive(Default)]
pub struct FakeDiscovery {
    listeners: RefCell<Vec<AnnouncementListener>>,
    responders: RefCell<Vec<(String, FakeProvider)>>,
    requests: Cell<usize>,
}

impl FakeDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, name: &str, provider: FakeProvider) {
        self.responders
            .borrow_mut()
            .push((name.to_string(), provider));
    }

    pub fn announce(&self, name: &str, provider: FakeProvider) {
        let announcement = ProviderAnnouncement {
            info: ProviderInfo::named(name),
            provider: provider.as_provider(),
        };
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(announcement.clone());
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }
}

impl DiscoveryPort for FakeDiscovery {
    fn subscribe(&self, listener: AnnouncementListener) {
        self.listeners.borrow_mut().push(listener);
    }

    fn request_providers(&self) {
        self.requests.set(self.requests.get() + 1);
        let responders = self.responders.borrow().clone();
        for (name, provider) in responders {
            self.announce(&name, provider);
        }
    }
}

// endregion: --- FakeDiscovery

// region:    --- ManualSpawner

/// Queues spawned tasks until the test drives them.
#[derive(Default)]
pub struct ManualSpawner {
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl ManualSpawner {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run queued tasks, including the ones they spawn, until the queue is empty.
    pub async fn run_all(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                task.await;
            }
        }
    }
}

impl Spawner for ManualSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}

// endregion: --- ManualSpawner

// region:    --- Name backends

#[derive(Default)]
pub struct FakeNames {
    names: HashMap<String, String>,
    avatars: HashMap<String, String>,
    fail_names: bool,
    fail_avatars: bool,
}

impl FakeNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, account: &str, name: &str) -> Self {
        self.names.insert(account.to_lowercase(), name.to_string());
        self
    }

    pub fn with_avatar(mut self, name: &str, url: &str) -> Self {
        self.avatars.insert(name.to_string(), url.to_string());
        self
    }

    pub fn failing_names(mut self) -> Self {
        self.fail_names = true;
        self
    }

    pub fn failing_avatars(mut self) -> Self {
        self.fail_avatars = true;
        self
    }
}

#[async_trait(?Send)]
impl NameService for FakeNames {
    async fn reverse_name(&self, account: &str) -> Result<Option<String>, IdentityError> {
        if self.fail_names {
            return Err(IdentityError::Rpc("name lookup unavailable".to_string()));
        }
        Ok(self.names.get(&account.to_lowercase()).cloned())
    }

    async fn avatar(&self, name: &str) -> Result<Option<String>, IdentityError> {
        if self.fail_avatars {
            return Err(IdentityError::Rpc("avatar lookup unavailable".to_string()));
        }
        Ok(self.avatars.get(name).cloned())
    }
}

/// `eth_call` answers keyed by `(to, calldata)`. Unscripted calls return `0x`.
#[derive(Default)]
pub struct FakeRpc {
    calls: HashMap<(String, String), String>,
    failing: bool,
}

impl FakeRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call(mut self, to: Address, data: Vec<u8>, output: Vec<u8>) -> Self {
        self.calls.insert(
            (to.to_string().to_lowercase(), hex::encode(data)),
            format!("0x{}", hex::encode(output)),
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[async_trait(?Send)]
impl RpcTransport for FakeRpc {
    async fn call(&self, method: &str, params: Value) -> Result<Value, IdentityError> {
        if self.failing {
            return Err(IdentityError::Rpc("connection refused".to_string()));
        }
        if method != "eth_call" {
            return Err(IdentityError::Rpc(format!("unexpected method {method}")));
        }

        let call = &params[0];
        let to = call["to"].as_str().unwrap_or_default().to_lowercase();
        let data = call["data"]
            .as_str()
            .unwrap_or_default()
            .trim_start_matches("0x")
            .to_string();

        let output = self
            .calls
            .get(&(to, data))
            .cloned()
            .unwrap_or_else(|| "0x".to_string());
        Ok(Value::String(output))
    }
}

// endregion: --- Name backends
