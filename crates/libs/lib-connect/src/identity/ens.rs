//! ENS reverse resolution over plain `eth_call`s.
//!
//! Lookup sequence for an account `A`:
//!
//! 1. `registry.resolver(namehash("<a>.addr.reverse"))` → reverse resolver
//! 2. `reverse_resolver.name(node)` → candidate name `N`
//! 3. `registry.resolver(namehash(N))` → forward resolver
//! 4. `forward_resolver.addr(namehash(N)) == A`, otherwise the claim is ignored
//!
//! Avatars come from the `avatar` text record of the forward resolver.

use alloy_primitives::{address, keccak256, Address, B256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use serde_json::json;

use super::{NameService, RpcTransport};
use crate::error::IdentityError;

/// ENS registry address (same on mainnet and the main testnets).
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    /// ENS registry.
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    /// Public resolver surface used for reverse and forward lookups.
    interface IEnsResolver {
        function name(bytes32 node) external view returns (string);
        function addr(bytes32 node) external view returns (address);
        function text(bytes32 node, string key) external view returns (string);
    }
}

pub struct EnsNameService<T> {
    transport: T,
    registry: Address,
    ipfs_gateway: String,
}

impl<T: RpcTransport> EnsNameService<T> {
    pub fn new(transport: T, ipfs_gateway: impl Into<String>) -> Self {
        Self {
            transport,
            registry: ENS_REGISTRY,
            ipfs_gateway: ipfs_gateway.into(),
        }
    }

    /// Point at a different registry deployment.
    pub fn with_registry(mut self, registry: Address) -> Self {
        self.registry = registry;
        self
    }

    /// Run `call` against `to`. Empty output (no contract, or a reverting resolver
    /// that returns nothing) decodes to `None`.
    async fn eth_call<C: SolCall>(&self, to: Address, call: C) -> Result<Option<C::Return>, IdentityError> {
        let params = json!([
            { "to": to.to_string(), "data": format!("0x{}", hex::encode(call.abi_encode())) },
            "latest"
        ]);
        let result = self.transport.call("eth_call", params).await?;

        let encoded = result
            .as_str()
            .ok_or_else(|| IdentityError::Decode(format!("eth_call returned {result}")))?;
        let output = hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| IdentityError::Decode(format!("eth_call result is not hex: {e}")))?;
        if output.is_empty() {
            return Ok(None);
        }

        C::abi_decode_returns(&output)
            .map(Some)
            .map_err(|e| IdentityError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }

    /// Resolver contract for `node`, `None` when unset.
    async fn resolver(&self, node: B256) -> Result<Option<Address>, IdentityError> {
        let resolver = self
            .eth_call(self.registry, IEnsRegistry::resolverCall { node })
            .await?;
        Ok(resolver.filter(|address| !address.is_zero()))
    }
}

#[async_trait(?Send)]
impl<T: RpcTransport> NameService for EnsNameService<T> {
    async fn reverse_name(&self, account: &str) -> Result<Option<String>, IdentityError> {
        let account: Address = account
            .parse()
            .map_err(|_| IdentityError::Decode(format!("not an address: {account}")))?;

        let reverse_node = namehash(&format!("{}.addr.reverse", hex::encode(account.as_slice())));
        let Some(reverse_resolver) = self.resolver(reverse_node).await? else {
            return Ok(None);
        };

        let name = match self
            .eth_call(reverse_resolver, IEnsResolver::nameCall { node: reverse_node })
            .await?
        {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };

        // Anyone can claim any name in their reverse record; only trust it if the
        // name resolves back to the account.
        let node = namehash(&name);
        let Some(forward_resolver) = self.resolver(node).await? else {
            return Ok(None);
        };
        let forward = self
            .eth_call(forward_resolver, IEnsResolver::addrCall { node })
            .await?;

        if forward == Some(account) {
            Ok(Some(name))
        } else {
            tracing::debug!(%account, name = %name, "reverse name does not resolve back to the account");
            Ok(None)
        }
    }

    async fn avatar(&self, name: &str) -> Result<Option<String>, IdentityError> {
        let node = namehash(name);
        let Some(resolver) = self.resolver(node).await? else {
            return Ok(None);
        };

        let record = self
            .eth_call(
                resolver,
                IEnsResolver::textCall {
                    node,
                    key: "avatar".to_string(),
                },
            )
            .await?;
        Ok(record.and_then(|uri| avatar_url(&uri, &self.ipfs_gateway)))
    }
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }

    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(buf);
    }
    node
}

/// Turn an avatar record into a URL an `<img>` can load.
///
/// NFT references (`eip155:1/erc721:...`) would need token metadata lookups and are
/// not resolved.
fn avatar_url(record: &str, ipfs_gateway: &str) -> Option<String> {
    let record = record.trim();
    if record.starts_with("https://") || record.starts_with("http://") || record.starts_with("data:") {
        return Some(record.to_string());
    }

    if let Some(path) = record.strip_prefix("ipfs://") {
        let path = path.strip_prefix("ipfs/").unwrap_or(path);
        if !path.is_empty() {
            return Some(format!("{}/{}", ipfs_gateway.trim_end_matches('/'), path));
        }
    }

    tracing::debug!(record, "unsupported avatar record");
    None
}
