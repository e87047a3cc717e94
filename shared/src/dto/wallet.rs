use serde::{Deserialize, Serialize};

/// Payload of the host's `onConnect` callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectEvent {
    pub accounts: Vec<String>,
    /// Chain id as reported by the wallet (hex string)
    pub chain_id: String,
    pub provider_name: String,
}

/// Payload of the host's `onChainChange` callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainChangeEvent {
    /// Normalized numeric chain id
    pub chain_id: u64,
    /// Chain id exactly as the wallet reported it
    pub hex_chain_id: String,
    pub name: String,
    pub allowed: bool,
}

/// Payload of the host's `onAccountsChanged` callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountsChangedEvent {
    /// The account now in use (first of `accounts`)
    pub account: String,
    pub accounts: Vec<String>,
}

/// Payload of the host's `onIdentity` callback, sent once a reverse name resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityEvent {
    pub account: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Short form of the account (`0xd8d...6045`), shown next to the name
    pub short_address: String,
}

/// An announced wallet, as listed to the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdns: Option<String>,
}
