//! Chain registry for runtime chain lookup.
//!
//! The registry holds the ordered network table and answers lookups by network key,
//! numeric id or hex id. It is immutable after construction and cheap to clone.
//!
//! ```rust
//! use lib_connect::chain::ChainRegistry;
//!
//! let chains = ChainRegistry::with_defaults();
//! assert_eq!(chains.describe("0xa").name, "Optimism");
//! assert!(chains.is_allowed(8453u64));
//! assert!(!chains.is_allowed("0x144"));
//! assert_eq!(chains.describe("0x999").name, "Unknown (0x999)");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::{default_networks, ChainDescriptor, ChainIdentifier, NetworkEntry};
use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct ChainRegistry {
    networks: Arc<Vec<NetworkEntry>>,
    /// numeric chain id -> index into `networks` (first entry wins)
    by_id: Arc<HashMap<u64, usize>>,
}

impl ChainRegistry {
    /// Build a registry from an ordered network table.
    ///
    /// Rejects an empty table, duplicate keys, and entries whose numeric and hex ids
    /// disagree.
    pub fn new(networks: Vec<NetworkEntry>) -> Result<Self, ConfigError> {
        if networks.is_empty() {
            return Err(ConfigError::EmptyNetworks);
        }

        let mut by_id = HashMap::new();
        let mut keys = std::collections::HashSet::new();

        for (index, entry) in networks.iter().enumerate() {
            if !keys.insert(entry.key.as_str()) {
                return Err(ConfigError::DuplicateNetwork(entry.key.clone()));
            }

            let from_hex = super::normalize(entry.descriptor.hex_id.as_str()).map_err(|source| {
                ConfigError::InvalidChainId {
                    key: entry.key.clone(),
                    source,
                }
            })?;
            if from_hex != entry.descriptor.numeric_id {
                return Err(ConfigError::ChainIdMismatch {
                    key: entry.key.clone(),
                    numeric: entry.descriptor.numeric_id,
                    hex: entry.descriptor.hex_id.clone(),
                });
            }

            by_id.entry(entry.descriptor.numeric_id).or_insert(index);
        }

        Ok(Self {
            networks: Arc::new(networks),
            by_id: Arc::new(by_id),
        })
    }

    /// Registry over the built-in network table.
    pub fn with_defaults() -> Self {
        let networks = default_networks();
        let by_id = networks
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.descriptor.numeric_id, index))
            .collect();

        Self {
            networks: Arc::new(networks),
            by_id: Arc::new(by_id),
        }
    }

    /// Descriptor by network key (`"ethereum"`, `"base"`, ...).
    pub fn get(&self, key: &str) -> Option<&ChainDescriptor> {
        self.networks
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.descriptor)
    }

    /// Descriptor by chain id in either encoding. Malformed ids find nothing.
    pub fn lookup(&self, id: impl Into<ChainIdentifier>) -> Option<&ChainDescriptor> {
        let numeric = id.into().normalize().ok()?;
        self.by_id
            .get(&numeric)
            .map(|&index| &self.networks[index].descriptor)
    }

    /// The matching descriptor, or an `Unknown (<raw>)` placeholder. Never fails.
    pub fn describe(&self, id: impl Into<ChainIdentifier>) -> ChainDescriptor {
        let id = id.into();
        match self.lookup(id.clone()) {
            Some(descriptor) => descriptor.clone(),
            None => ChainDescriptor::unknown(&id),
        }
    }

    pub fn is_allowed(&self, id: impl Into<ChainIdentifier>) -> bool {
        self.lookup(id).is_some_and(|descriptor| descriptor.allowed)
    }

    /// Network name for a chain id, or the raw identifier when unknown.
    pub fn name_of(&self, id: impl Into<ChainIdentifier>) -> String {
        let id = id.into();
        match self.lookup(id.clone()) {
            Some(descriptor) => descriptor.name.clone(),
            None => id.to_string(),
        }
    }

    /// The first allowed entry; the first entry when none is allowed.
    pub fn default_chain(&self) -> &ChainDescriptor {
        self.networks
            .iter()
            .map(|entry| &entry.descriptor)
            .find(|descriptor| descriptor.allowed)
            .unwrap_or(&self.networks[0].descriptor)
    }

    /// Numeric ids of every allowed chain, in table order.
    pub fn allowed_chains(&self) -> Vec<u64> {
        self.networks
            .iter()
            .filter(|entry| entry.descriptor.allowed)
            .map(|entry| entry.descriptor.numeric_id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChainDescriptor)> {
        self.networks
            .iter()
            .map(|entry| (entry.key.as_str(), &entry.descriptor))
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
