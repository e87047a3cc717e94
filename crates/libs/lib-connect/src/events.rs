//! # Host Callbacks
//!
//! One optional handler per event. Registering again replaces the previous handler.
//!
//! Handlers run after the controller has committed its state and released every
//! borrow, so a handler may call back into the controller. A panicking handler is
//! caught and logged where the target supports unwinding; controller state is already
//! committed at that point either way.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use shared::{AccountsChangedEvent, ChainChangeEvent, ConnectEvent, IdentityEvent};

type Handler<E> = Option<Rc<dyn Fn(&E)>>;

#[derive(Default, Clone)]
pub struct Callbacks {
    on_connect: Handler<ConnectEvent>,
    on_disconnect: Option<Rc<dyn Fn()>>,
    on_chain_change: Handler<ChainChangeEvent>,
    on_accounts_changed: Handler<AccountsChangedEvent>,
    on_identity: Handler<IdentityEvent>,
}

impl Callbacks {
    pub fn set_on_connect(&mut self, handler: impl Fn(&ConnectEvent) + 'static) {
        self.on_connect = Some(Rc::new(handler));
    }

    pub fn set_on_disconnect(&mut self, handler: impl Fn() + 'static) {
        self.on_disconnect = Some(Rc::new(handler));
    }

    pub fn set_on_chain_change(&mut self, handler: impl Fn(&ChainChangeEvent) + 'static) {
        self.on_chain_change = Some(Rc::new(handler));
    }

    pub fn set_on_accounts_changed(&mut self, handler: impl Fn(&AccountsChangedEvent) + 'static) {
        self.on_accounts_changed = Some(Rc::new(handler));
    }

    pub fn set_on_identity(&mut self, handler: impl Fn(&IdentityEvent) + 'static) {
        self.on_identity = Some(Rc::new(handler));
    }

    pub(crate) fn connect_handler(&self) -> Handler<ConnectEvent> {
        self.on_connect.clone()
    }

    pub(crate) fn disconnect_handler(&self) -> Option<Rc<dyn Fn()>> {
        self.on_disconnect.clone()
    }

    pub(crate) fn chain_change_handler(&self) -> Handler<ChainChangeEvent> {
        self.on_chain_change.clone()
    }

    pub(crate) fn accounts_changed_handler(&self) -> Handler<AccountsChangedEvent> {
        self.on_accounts_changed.clone()
    }

    pub(crate) fn identity_handler(&self) -> Handler<IdentityEvent> {
        self.on_identity.clone()
    }
}

/// Invoke a host handler, containing a panic to the handler itself.
pub(crate) fn dispatch(event: &'static str, handler: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(handler)).is_err() {
        tracing::error!(event, "host callback panicked");
    }
}
