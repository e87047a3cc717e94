//! # Identity Resolution
//!
//! Best-effort reverse lookup of a human-readable name and avatar for the connected
//! account. Nothing here has a user-visible error path: a missing record, a failing
//! RPC endpoint or an undecodable answer all end in "no identity", logged at debug
//! level, and the host keeps showing the short address.
//!
//! ## Architecture
//!
//! ```text
//! ConnectionController ──spawn──▶ IdentityResolver ──▶ dyn NameService
//!                                                        └─ EnsNameService ──▶ dyn RpcTransport
//! ```

mod ens;

pub use ens::{namehash, EnsNameService, ENS_REGISTRY};

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::IdentityError;

/// JSON-RPC access to the chain holding the name records.
#[async_trait(?Send)]
pub trait RpcTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, IdentityError>;
}

/// Reverse name + avatar lookups.
#[async_trait(?Send)]
pub trait NameService {
    /// The primary name of `account`, if it has one.
    async fn reverse_name(&self, account: &str) -> Result<Option<String>, IdentityError>;

    /// A displayable avatar URL for `name`, if it has one.
    async fn avatar(&self, name: &str) -> Result<Option<String>, IdentityError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl Identity {
    pub fn to_event(&self) -> shared::IdentityEvent {
        shared::IdentityEvent {
            account: self.account.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            short_address: shared::short_address(&self.account),
        }
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    service: Rc<dyn NameService>,
}

impl IdentityResolver {
    pub fn new(service: Rc<dyn NameService>) -> Self {
        Self { service }
    }

    /// Resolve name, then avatar. Every failure is swallowed; an avatar failure still
    /// yields the name.
    pub async fn resolve(&self, account: &str) -> Option<Identity> {
        let name = match self.service.reverse_name(account).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::debug!(account, "no reverse name");
                return None;
            }
            Err(err) => {
                tracing::debug!(account, error = %err, "reverse name lookup failed");
                return None;
            }
        };

        let avatar = match self.service.avatar(&name).await {
            Ok(avatar) => avatar,
            Err(err) => {
                tracing::debug!(name = %name, error = %err, "avatar lookup failed");
                None
            }
        };

        Some(Identity {
            account: account.to_string(),
            name,
            avatar,
        })
    }
}
