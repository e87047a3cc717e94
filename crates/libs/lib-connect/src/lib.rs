//! # lib-connect
//!
//! Wallet connection core: EIP-6963 provider discovery, the EIP-1193 connection
//! state machine, chain normalization, session persistence and ENS identity lookup.
//!
//! Everything here is single-threaded (`Rc`, `RefCell`, `?Send` futures) and free of
//! browser types. The browser bindings live in `wallet-web`, which supplies the
//! [`DiscoveryPort`], [`Eip1193Provider`], [`SessionStore`], [`Spawner`] and
//! [`RpcTransport`] implementations.
//!
//! ## Example
//!
//! ```
//! use lib_connect::chain::{normalize, ChainRegistry};
//!
//! assert_eq!(normalize("0xa").unwrap(), 10);
//! assert_eq!(normalize("10").unwrap(), 10);
//! assert_eq!(normalize(10u64).unwrap(), 10);
//!
//! let chains = ChainRegistry::with_defaults();
//! assert_eq!(chains.default_chain().hex_id, "0x1");
//! assert_eq!(chains.describe("0x999").name, "Unknown (0x999)");
//! ```

pub mod chain;
pub mod config;
pub mod context;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod events;
pub mod identity;
pub mod provider;
pub mod session;
pub mod spawn;

#[cfg(test)]
mod test_support;

pub use chain::{ChainDescriptor, ChainIdentifier, ChainRegistry, NetworkEntry};
pub use config::ConnectConfig;
pub use context::ConnectContext;
pub use controller::{ActiveConnection, Connection, ConnectionController, ConnectionPhase, ResumeOutcome};
pub use discovery::{AnnouncementListener, DiscoveryPort, ProviderAnnouncement, ProviderRegistry};
pub use error::{ChainIdError, ConfigError, ConnectError, IdentityError, ProviderError, Result};
pub use identity::{EnsNameService, Identity, IdentityResolver, NameService, RpcTransport};
pub use provider::{Capability, Eip1193Provider, EventListener, ProviderEvent, ProviderHandle, ProviderInfo, ProviderRequest};
pub use session::{MemoryStore, SessionState, SessionStore};
pub use spawn::Spawner;
