//! # Error Types
//!
//! Error handling for the connection core.
//!
//! ## Error Categories
//!
//! - **[`ProviderError`]**: a wallet provider rejected or failed an EIP-1193 request
//! - **[`ConnectError`]**: failures surfaced by `connect()` and `switch_network()`
//! - **[`ChainIdError`]**: a chain identifier that cannot be normalized
//! - **[`ConfigError`]**: an invalid network table or configuration payload
//! - **[`IdentityError`]**: ENS lookups; never reaches the host, only the log
//!
//! Failures of the revoke step in `disconnect()` and of every identity lookup are
//! logged and swallowed, so they have no variant in [`ConnectError`].

use thiserror::Error;

/// EIP-1193 error code for "the provider does not support the requested method".
pub const UNSUPPORTED_METHOD: i64 = 4200;

/// EIP-1193 error code for "the user rejected the request".
pub const USER_REJECTED: i64 = 4001;

/// Error returned by a wallet provider for a failed request.
///
/// Mirrors the `{ code, message }` shape of EIP-1193 `ProviderRpcError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error for a method the provider does not implement.
    pub fn unsupported(method: &str) -> Self {
        Self::new(UNSUPPORTED_METHOD, format!("{method} is not supported"))
    }

    pub fn is_unsupported(&self) -> bool {
        self.code == UNSUPPORTED_METHOD
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }
}

/// A chain identifier that is neither a hex-prefixed nor a decimal integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainIdError {
    #[error("empty chain id")]
    Empty,

    #[error("malformed chain id: {0}")]
    Malformed(String),
}

/// Failures of the connection handshake and of network switching.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider answered, but not with the shape EIP-1193 prescribes.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Invalid chain id: {0}")]
    InvalidChainId(#[from] ChainIdError),

    /// A disconnect completed while this handshake was in flight; nothing was committed.
    #[error("Connection attempt superseded by a disconnect")]
    Superseded,
}

/// Invalid configuration: the network table or the JSON/JS payload carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Configuration error: network table is empty")]
    EmptyNetworks,

    #[error("Configuration error: duplicate network `{0}`")]
    DuplicateNetwork(String),

    #[error("Configuration error: network `{key}` declares chain id {numeric} but hex id {hex}")]
    ChainIdMismatch {
        key: String,
        numeric: u64,
        hex: String,
    },

    #[error("Configuration error: network `{key}`: {source}")]
    InvalidChainId { key: String, source: ChainIdError },

    #[error("Configuration error: unknown ENS network `{0}`")]
    UnknownEnsNetwork(String),

    #[error("Configuration error: {0}")]
    Parse(String),
}

/// Identity resolution failures. Logged at debug level and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("ABI decode error: {0}")]
    Decode(String),
}

/// Convenience type alias for `Result<T, ConnectError>`.
pub type Result<T> = std::result::Result<T, ConnectError>;
