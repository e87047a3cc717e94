//! # Chains
//!
//! Chain identifiers, chain descriptors and the static network registry.
//!
//! Wallets report chain ids as hex strings (`"0xa4b1"`), configuration carries both
//! a number and a hex string, and hosts pass whichever they have at hand. Everything
//! funnels through [`normalize`], which accepts all of those forms and returns the
//! canonical integer:
//!
//! ```rust
//! use lib_connect::chain::normalize;
//!
//! assert_eq!(normalize("0xa").unwrap(), 10);
//! assert_eq!(normalize("10").unwrap(), 10);
//! assert_eq!(normalize(10u64).unwrap(), 10);
//! ```

mod networks;
mod registry;

pub use networks::default_networks;
pub use registry::ChainRegistry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChainIdError;

/// A chain identifier in either of its two encodings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainIdentifier {
    Numeric(u64),
    Text(String),
}

impl ChainIdentifier {
    /// Interpret a JSON value returned by a provider (`eth_chainId`, `chainChanged`).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_u64().map(Self::Numeric),
            _ => None,
        }
    }

    pub fn normalize(&self) -> Result<u64, ChainIdError> {
        match self {
            ChainIdentifier::Numeric(id) => Ok(*id),
            ChainIdentifier::Text(raw) => parse_text(raw),
        }
    }
}

impl fmt::Display for ChainIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainIdentifier::Numeric(id) => write!(f, "{id}"),
            ChainIdentifier::Text(raw) => f.write_str(raw),
        }
    }
}

impl From<u64> for ChainIdentifier {
    fn from(id: u64) -> Self {
        ChainIdentifier::Numeric(id)
    }
}

impl From<&str> for ChainIdentifier {
    fn from(raw: &str) -> Self {
        ChainIdentifier::Text(raw.to_string())
    }
}

impl From<String> for ChainIdentifier {
    fn from(raw: String) -> Self {
        ChainIdentifier::Text(raw)
    }
}

impl From<&String> for ChainIdentifier {
    fn from(raw: &String) -> Self {
        ChainIdentifier::Text(raw.clone())
    }
}

/// Normalize a chain identifier to its integer value.
///
/// A string beginning with `0x` is parsed as base-16, any other string as base-10.
pub fn normalize(id: impl Into<ChainIdentifier>) -> Result<u64, ChainIdError> {
    id.into().normalize()
}

/// Hex encoding used by EIP-1193 (`0x`-prefixed, lowercase, no leading zeros).
pub fn to_hex(id: u64) -> String {
    format!("{id:#x}")
}

fn parse_text(raw: &str) -> Result<u64, ChainIdError> {
    if raw.is_empty() {
        return Err(ChainIdError::Empty);
    }

    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => raw.parse::<u64>(),
    };

    parsed.map_err(|_| ChainIdError::Malformed(raw.to_string()))
}

/// Display metadata and allow-list flag for one network.
///
/// Serialized with the field names of the host-side network configuration
/// (`chainId`, `chainIdHex`, `showInUi`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub name: String,
    #[serde(rename = "chainId")]
    pub numeric_id: u64,
    #[serde(rename = "chainIdHex")]
    pub hex_id: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rpc_url: String,
    #[serde(rename = "showInUi", alias = "showInUI", default)]
    pub allowed: bool,
}

impl ChainDescriptor {
    /// Placeholder for a chain the registry does not know. Never allowed.
    pub fn unknown(raw: &ChainIdentifier) -> Self {
        let numeric_id = raw.normalize().unwrap_or_default();
        let hex_id = match raw {
            ChainIdentifier::Text(text) => text.clone(),
            ChainIdentifier::Numeric(id) => to_hex(*id),
        };

        Self {
            name: format!("Unknown ({raw})"),
            numeric_id,
            hex_id,
            icon: String::new(),
            rpc_url: String::new(),
            allowed: false,
        }
    }
}

/// A keyed entry of the ordered network table (`ethereum`, `arbitrum`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub key: String,
    #[serde(flatten)]
    pub descriptor: ChainDescriptor,
}

impl NetworkEntry {
    pub fn new(key: impl Into<String>, descriptor: ChainDescriptor) -> Self {
        Self {
            key: key.into(),
            descriptor,
        }
    }
}
