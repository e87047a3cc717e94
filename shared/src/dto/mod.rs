//! # Data Transfer Objects (DTOs)
//!
//! Payloads handed from the connection core to the host page.
//!
//! ## Module Organization
//!
//! - [`wallet`] - Callback payloads (`onConnect`, `onChainChange`, ...) and provider summaries
//!
//! ## Serialization Format
//!
//! The host is JavaScript, so every DTO serializes with **camelCase** field names
//! (`chainId`, `hexChainId`, `providerName`). Optional fields are omitted when `None`.
//!
//! ```text
//! onChainChange({
//!   "chainId": 42161,
//!   "hexChainId": "0xa4b1",
//!   "name": "Arbitrum",
//!   "allowed": true
//! })
//! ```

pub mod wallet;

pub use wallet::*;
