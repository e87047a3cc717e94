//! # Wallet Provider Port
//!
//! The EIP-1193 capability every injected wallet exposes, reduced to what the
//! controller needs: a request/response call plus subscribe/unsubscribe for the
//! `accountsChanged`, `chainChanged` and `disconnect` events.
//!
//! Optional capabilities (removing listeners, revoking permissions) are reported as a
//! [`Capability`] instead of being silently skipped, so callers can tell "the wallet
//! cannot do this" from "the wallet tried and failed".

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProviderError;

/// The provider requests issued by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequest {
    /// `eth_requestAccounts`: prompts the user on first use.
    RequestAccounts,
    /// `eth_accounts`: never prompts.
    Accounts,
    ChainId,
    SwitchChain { chain_id_hex: String },
    RevokePermissions,
}

impl ProviderRequest {
    pub fn method(&self) -> &'static str {
        match self {
            ProviderRequest::RequestAccounts => "eth_requestAccounts",
            ProviderRequest::Accounts => "eth_accounts",
            ProviderRequest::ChainId => "eth_chainId",
            ProviderRequest::SwitchChain { .. } => "wallet_switchEthereumChain",
            ProviderRequest::RevokePermissions => "wallet_revokePermissions",
        }
    }

    /// `params` member of the EIP-1193 request object, if any.
    pub fn params(&self) -> Option<Value> {
        match self {
            ProviderRequest::SwitchChain { chain_id_hex } => {
                Some(json!([{ "chainId": chain_id_hex }]))
            }
            ProviderRequest::RevokePermissions => Some(json!([{ "eth_accounts": {} }])),
            _ => None,
        }
    }

    /// The full `{ method, params }` argument of `provider.request(...)`.
    pub fn to_json(&self) -> Value {
        match self.params() {
            Some(params) => json!({ "method": self.method(), "params": params }),
            None => json!({ "method": self.method() }),
        }
    }
}

/// Events a provider pushes to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    /// Raw chain id exactly as the provider reported it.
    ChainChanged(String),
    Disconnected,
}

impl ProviderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderEvent::AccountsChanged(_) => "accountsChanged",
            ProviderEvent::ChainChanged(_) => "chainChanged",
            ProviderEvent::Disconnected => "disconnect",
        }
    }
}

pub type EventListener = Rc<dyn Fn(ProviderEvent)>;

/// Outcome of an optional provider capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
    /// The provider does not offer this capability.
    Unsupported,
    Succeeded(T),
    Failed(ProviderError),
}

impl<T> Capability<T> {
    /// Classify a request result; EIP-1193 code 4200 counts as unsupported.
    pub fn from_result(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Capability::Succeeded(value),
            Err(err) if err.is_unsupported() => Capability::Unsupported,
            Err(err) => Capability::Failed(err),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Capability::Succeeded(_))
    }
}

/// An injected EIP-1193 provider.
///
/// Implementations are single-threaded (`?Send`): they wrap JS objects in the browser
/// and scripted fakes in tests.
#[async_trait(?Send)]
pub trait Eip1193Provider {
    async fn request(&self, request: &ProviderRequest) -> Result<Value, ProviderError>;

    /// Register one listener for all three provider events.
    fn subscribe(&self, listener: EventListener) -> Capability<()>;

    /// Drop every listener registered through [`Eip1193Provider::subscribe`].
    fn remove_all_listeners(&self) -> Capability<()>;
}

/// EIP-6963 provider info (`detail.info` of an announcement).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdns: Option<String>,
}

impl ProviderInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// An announced provider: its info plus the capability object.
#[derive(Clone)]
pub struct ProviderHandle {
    info: ProviderInfo,
    provider: Rc<dyn Eip1193Provider>,
}

impl ProviderHandle {
    pub fn new(info: ProviderInfo, provider: Rc<dyn Eip1193Provider>) -> Self {
        Self { info, provider }
    }

    /// Display name; the registry's dedup key.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &ProviderInfo {
        &self.info
    }

    pub fn provider(&self) -> &Rc<dyn Eip1193Provider> {
        &self.provider
    }

    /// Whether both handles wrap the same capability object.
    pub fn same_provider(&self, other: &ProviderHandle) -> bool {
        Rc::ptr_eq(&self.provider, &other.provider)
    }

    pub fn summary(&self) -> shared::ProviderSummary {
        shared::ProviderSummary {
            name: self.info.name.clone(),
            icon: self.info.icon.clone(),
            rdns: self.info.rdns.clone(),
        }
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
