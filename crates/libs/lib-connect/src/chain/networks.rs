//! Built-in network table.

use super::{ChainDescriptor, NetworkEntry};

/// (key, name, chain id, rpc url, icon, shown in the UI)
const NETWORKS: &[(&str, &str, u64, &str, &str, bool)] = &[
    ("ethereum", "Ethereum", 1, "https://ethereum-rpc.publicnode.com", "./assets/img/eth.png", true),
    ("arbitrum", "Arbitrum", 42161, "https://1rpc.io/arb", "./assets/img/arb.png", true),
    ("optimism", "Optimism", 10, "https://mainnet.optimism.io", "./assets/img/op.png", true),
    ("base", "Base", 8453, "https://base-rpc.publicnode.com", "./assets/img/base.png", true),
    ("zksync", "ZKsync", 324, "https://mainnet.era.zksync.io", "./assets/img/zksync.png", false),
    ("scroll", "Scroll", 534352, "https://rpc.scroll.io", "./assets/img/scroll.png", false),
    ("zkevm", "zkEvm", 1101, "https://zkevm-rpc.com", "./assets/img/zkevm.png", false),
    ("sepolia", "Sepolia", 11155111, "https://rpc.sepolia.org", "./assets/img/sepolia.png", false),
];

/// The default ordered network table. Ethereum comes first and is the fallback chain.
pub fn default_networks() -> Vec<NetworkEntry> {
    NETWORKS
        .iter()
        .map(|&(key, name, chain_id, rpc_url, icon, allowed)| {
            NetworkEntry::new(
                key,
                ChainDescriptor {
                    name: name.to_string(),
                    numeric_id: chain_id,
                    hex_id: super::to_hex(chain_id),
                    icon: icon.to_string(),
                    rpc_url: rpc_url.to_string(),
                    allowed,
                },
            )
        })
        .collect()
}
