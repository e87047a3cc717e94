//! Injected EIP-1193 provider objects
//!
//! Wraps the `provider` object of an EIP-6963 announcement. Methods are looked up
//! with `js_sys::Reflect` on every call, so partial providers (no `on`, no
//! `removeAllListeners`) surface as `Capability::Unsupported` instead of a throw.

use std::cell::RefCell;

use async_trait::async_trait;
use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Array, Function, Object, Promise, Reflect};
use lib_connect::{Capability, Eip1193Provider, EventListener, ProviderError, ProviderEvent, ProviderRequest};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::utils::{chain_id_from_parts, provider_error_from_parts};

const EVENTS: [&str; 3] = ["accountsChanged", "chainChanged", "disconnect"];

type JsListener = Closure<dyn FnMut(JsValue)>;

pub struct InjectedProvider {
    object: Object,
    /// Closures handed to `on`; they must outlive their registration.
    listeners: RefCell<Vec<(&'static str, JsListener)>>,
}

impl InjectedProvider {
    pub fn new(object: Object) -> Self {
        Self {
            object,
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.object, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
    }

    fn event_closure(event: &'static str, listener: EventListener) -> JsListener {
        Closure::wrap(Box::new(move |payload: JsValue| {
            match to_provider_event(event, &payload) {
                Some(event) => listener(event),
                None => log::warn!("[Provider] Ignoring malformed {} payload: {:?}", event, payload),
            }
        }) as Box<dyn FnMut(JsValue)>)
    }
}

#[async_trait(?Send)]
impl Eip1193Provider for InjectedProvider {
    async fn request(&self, request: &ProviderRequest) -> Result<Value, ProviderError> {
        let method = request.method();
        let Some(function) = self.method("request") else {
            return Err(ProviderError::unsupported(method));
        };

        let args = JsValue::from_serde(&request.to_json())
            .map_err(|e| ProviderError::new(-32602, format!("cannot encode {method}: {e}")))?;
        let result = function.call1(&self.object, &args).map_err(to_provider_error)?;
        let result = match result.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(to_provider_error)?,
            Err(value) => value,
        };

        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        result
            .into_serde::<Value>()
            .map_err(|e| ProviderError::new(-32603, format!("cannot decode {method} result: {e}")))
    }

    fn subscribe(&self, listener: EventListener) -> Capability<()> {
        let Some(on) = self.method("on") else {
            return Capability::Unsupported;
        };

        let mut listeners = self.listeners.borrow_mut();
        for event in EVENTS {
            let closure = Self::event_closure(event, listener.clone());
            if let Err(err) = on.call2(&self.object, &JsValue::from_str(event), closure.as_ref()) {
                return Capability::Failed(to_provider_error(err));
            }
            listeners.push((event, closure));
        }
        Capability::Succeeded(())
    }

    fn remove_all_listeners(&self) -> Capability<()> {
        if let Some(remove_all) = self.method("removeAllListeners") {
            return match remove_all.call0(&self.object) {
                Ok(_) => {
                    self.listeners.borrow_mut().clear();
                    Capability::Succeeded(())
                }
                Err(err) => Capability::Failed(to_provider_error(err)),
            };
        }

        // Fall back to removing our own closures one by one.
        let Some(remove) = self.method("removeListener") else {
            return Capability::Unsupported;
        };
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for (event, closure) in &listeners {
            if let Err(err) = remove.call2(&self.object, &JsValue::from_str(event), closure.as_ref()) {
                log::warn!("[Provider] removeListener({}) failed: {:?}", event, err);
            }
        }
        Capability::Succeeded(())
    }
}

fn to_provider_event(event: &str, payload: &JsValue) -> Option<ProviderEvent> {
    match event {
        "accountsChanged" => {
            let accounts: Array = payload.clone().dyn_into().ok()?;
            accounts
                .iter()
                .map(|account| account.as_string())
                .collect::<Option<Vec<_>>>()
                .map(ProviderEvent::AccountsChanged)
        }
        "chainChanged" => chain_id_from_parts(payload.as_string(), payload.as_f64())
            .map(ProviderEvent::ChainChanged),
        "disconnect" => Some(ProviderEvent::Disconnected),
        _ => None,
    }
}

/// EIP-1193 `ProviderRpcError` (`{ code, message }`) or any thrown value.
pub fn to_provider_error(value: JsValue) -> ProviderError {
    let code = Reflect::get(&value, &JsValue::from_str("code"))
        .ok()
        .and_then(|code| code.as_f64());
    let message = Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .or_else(|| value.as_string());
    provider_error_from_parts(code, message)
}
