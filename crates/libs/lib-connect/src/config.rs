use serde::{Deserialize, Serialize};

use crate::chain::{default_networks, ChainRegistry, NetworkEntry};
use crate::error::ConfigError;

pub const DEFAULT_ENS_NETWORK: &str = "ethereum";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Host-supplied configuration. Every field has a default, so `{}` is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectConfig {
    /// Ordered network table; the first allowed entry is the default chain.
    pub networks: Vec<NetworkEntry>,
    /// Network whose `rpcUrl` serves name lookups. Empty disables them.
    pub ens_network: String,
    pub ipfs_gateway: String,
    pub auto_reconnect: bool,
    /// Clear a dormant session after this long. `None` keeps it forever.
    pub stale_session_timeout_ms: Option<u32>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            networks: default_networks(),
            ens_network: DEFAULT_ENS_NETWORK.to_string(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            auto_reconnect: true,
            stale_session_timeout_ms: None,
        }
    }
}

impl ConnectConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chain_registry()?;

        if !self.ens_network.is_empty() && !self.networks.iter().any(|n| n.key == self.ens_network) {
            return Err(ConfigError::UnknownEnsNetwork(self.ens_network.clone()));
        }

        Ok(())
    }

    pub fn chain_registry(&self) -> Result<ChainRegistry, ConfigError> {
        ChainRegistry::new(self.networks.clone())
    }

    /// JSON-RPC endpoint for name lookups, if lookups are enabled and configured.
    pub fn ens_rpc_url(&self) -> Option<&str> {
        self.networks
            .iter()
            .find(|n| n.key == self.ens_network)
            .map(|n| n.descriptor.rpc_url.as_str())
            .filter(|url| !url.is_empty())
    }
}
