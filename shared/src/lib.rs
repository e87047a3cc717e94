//! # Shared Types
//!
//! Types exchanged between the connection core (`lib-connect`) and its hosts
//! (`wallet-web`, and through it the page's JavaScript).
//!
//! ## Structure
//!
//! - **[`dto`]**: Serde payloads of the host callbacks
//! - **[`utils`]**: Address formatting helpers
//!
//! ## Usage
//!
//! ```rust
//! use shared::dto::ChainChangeEvent;
//! use shared::utils::short_address;
//!
//! let event = ChainChangeEvent {
//!     chain_id: 10,
//!     hex_chain_id: "0xa".to_string(),
//!     name: "Optimism".to_string(),
//!     allowed: true,
//! };
//! assert_eq!(serde_json::to_value(&event).unwrap()["hexChainId"], "0xa");
//! assert_eq!(short_address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"), "0xd8d...6045");
//! ```

pub mod dto;
pub mod utils;

// Re-export commonly used types for convenience
pub use dto::*;
pub use utils::*;
