//! `ConnectWallet`: the JS-facing API
//!
//! ```js
//! import init, { ConnectWallet } from "./pkg/wallet_web.js";
//!
//! await init();
//! const wallet = new ConnectWallet({ autoReconnect: true });
//! wallet.onConnect(({ accounts, chainId, providerName }) => render(accounts[0]));
//! wallet.onDisconnect(() => render(null));
//! wallet.start();
//! await wallet.connect(wallet.providers()[0].name);
//! ```
//!
//! Async operations return Promises. Failures of `connect` and `switchNetwork`
//! reject; everything else resolves.

use std::rc::Rc;

use js_sys::{Function, Promise};
use lib_connect::{
    ConfigError, ConnectConfig, ConnectContext, EnsNameService, NameService, ResumeOutcome,
};
use serde::Serialize;
use shared::{ConnectEvent, ProviderSummary};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::services::{HttpRpc, LocalSessionStore, LocalSpawner, WindowDiscovery};
use crate::utils::outcome_label;

#[wasm_bindgen]
pub struct ConnectWallet {
    context: Rc<ConnectContext>,
    discovery: Rc<WindowDiscovery>,
}

#[wasm_bindgen]
impl ConnectWallet {
    /// `config` is a `ConnectConfig` object; `undefined` uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ConnectWallet, JsError> {
        let config: ConnectConfig = if config.is_undefined() || config.is_null() {
            ConnectConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| ConfigError::Parse(e.to_string()))?
        };

        let names = config.ens_rpc_url().map(|url| {
            Rc::new(EnsNameService::new(HttpRpc::new(url), config.ipfs_gateway.clone()))
                as Rc<dyn NameService>
        });
        if names.is_none() {
            log::info!("[Connect] Name lookups disabled");
        }

        let context = ConnectContext::new(
            config,
            Rc::new(LocalSessionStore::new()),
            Rc::new(LocalSpawner),
            names,
        )?;

        Ok(ConnectWallet {
            context: Rc::new(context),
            discovery: Rc::new(WindowDiscovery::new()?),
        })
    }

    /// Discover providers and resume the stored session.
    ///
    /// Returns `"resumed"`, `"dormant"` or `"none"`.
    pub fn start(&self) -> String {
        let outcome = self.context.start(&*self.discovery);

        if let (ResumeOutcome::Dormant { provider_name }, Some(timeout_ms)) =
            (&outcome, self.context.config().stale_session_timeout_ms)
        {
            log::info!(
                "[Connect] Waiting {}ms for {} before dropping the stored session",
                timeout_ms,
                provider_name
            );
            let controller = self.context.controller().clone();
            wasm_bindgen_futures::spawn_local(async move {
                gloo_timers::future::TimeoutFuture::new(timeout_ms).await;
                controller.expire_dormant_session();
            });
        }

        outcome_label(&outcome).to_string()
    }

    /// Resolves with `{ accounts, chainId, providerName }`, or `undefined` when the
    /// provider is unknown or already connecting.
    pub fn connect(&self, provider_name: String) -> Promise {
        let controller = self.context.controller().clone();
        future_to_promise(async move {
            match controller.connect(&provider_name).await {
                Ok(Some(connection)) => to_js(&ConnectEvent {
                    accounts: connection.accounts,
                    chain_id: connection.chain_id,
                    provider_name: connection.provider_name,
                })
                .map_err(JsValue::from),
                Ok(None) => Ok(JsValue::UNDEFINED),
                Err(err) => Err(JsError::new(&err.to_string()).into()),
            }
        })
    }

    pub fn disconnect(&self) -> Promise {
        let controller = self.context.controller().clone();
        future_to_promise(async move {
            controller.disconnect().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Switch to the network with key `network` (`"ethereum"`, `"base"`, ...).
    #[wasm_bindgen(js_name = switchNetwork)]
    pub fn switch_network(&self, network: String) -> Promise {
        let controller = self.context.controller().clone();
        future_to_promise(async move {
            controller
                .switch_to(&network)
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|err| JsError::new(&err.to_string()).into())
        })
    }

    /// Resolves with the current account, or `undefined`. Never prompts.
    #[wasm_bindgen(js_name = refreshAccount)]
    pub fn refresh_account(&self) -> Promise {
        let controller = self.context.controller().clone();
        future_to_promise(async move {
            Ok(controller
                .refresh_account()
                .await
                .map(JsValue::from)
                .unwrap_or(JsValue::UNDEFINED))
        })
    }

    /// Announced providers as `{ name, icon, rdns }`, in announcement order.
    pub fn providers(&self) -> Result<JsValue, JsError> {
        let providers: Vec<ProviderSummary> = self
            .context
            .providers()
            .list()
            .iter()
            .map(|handle| handle.summary())
            .collect();
        Ok(to_js(&providers)?)
    }

    /// The configured network table.
    pub fn networks(&self) -> Result<JsValue, JsError> {
        Ok(to_js(&self.context.config().networks)?)
    }

    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.context.controller().is_connected()
    }

    pub fn account(&self) -> Option<String> {
        self.context.controller().account()
    }

    #[wasm_bindgen(js_name = chainId)]
    pub fn chain_id(&self) -> Option<String> {
        self.context.controller().chain_id()
    }

    #[wasm_bindgen(js_name = onConnect)]
    pub fn on_connect(&self, callback: Function) {
        self.context
            .controller()
            .on_connect(move |event| call_js(&callback, event));
    }

    #[wasm_bindgen(js_name = onDisconnect)]
    pub fn on_disconnect(&self, callback: Function) {
        self.context.controller().on_disconnect(move || {
            if let Err(err) = callback.call0(&JsValue::NULL) {
                log::error!("[Connect] onDisconnect threw: {:?}", err);
            }
        });
    }

    #[wasm_bindgen(js_name = onChainChange)]
    pub fn on_chain_change(&self, callback: Function) {
        self.context
            .controller()
            .on_chain_change(move |event| call_js(&callback, event));
    }

    #[wasm_bindgen(js_name = onAccountsChanged)]
    pub fn on_accounts_changed(&self, callback: Function) {
        self.context
            .controller()
            .on_accounts_changed(move |event| call_js(&callback, event));
    }

    #[wasm_bindgen(js_name = onIdentity)]
    pub fn on_identity(&self, callback: Function) {
        self.context
            .controller()
            .on_identity(move |event| call_js(&callback, event));
    }
}

/// Plain objects, never `Map`s, so flattened network entries read naturally in JS.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

/// Call a host callback with a serialized payload. A throwing callback is logged.
fn call_js<T: Serialize>(callback: &Function, payload: &T) {
    match to_js(payload) {
        Ok(payload) => {
            if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                log::error!("[Connect] Callback threw: {:?}", err);
            }
        }
        Err(err) => log::error!("[Connect] Failed to serialize callback payload: {:?}", err),
    }
}
