//! # Shared Utility Functions
//!
//! Address helpers used by the connection core and the browser adapter.
//!
//! ## Address Formatting
//!
//! - [`format_address`] - Format address with ellipsis (first N and last M characters)
//! - [`short_address`] - The connect button's form: first 5 and last 4 characters
//!
//! ## Usage
//!
//! ```rust
//! use shared::utils::short_address;
//!
//! let address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
//! assert_eq!(short_address(address), "0xd8d...6045");
//! ```

/// Format a wallet address by showing the first `prefix_len` and last `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned as-is.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
/// assert_eq!(format_address(addr, 6, 4), "0xd8dA...6045");
/// assert_eq!(format_address("0x1234", 4, 4), "0x1234");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let address_len = address.len();

    // Hex addresses are ASCII; anything else is returned untouched rather than sliced
    if !address.is_ascii()
        || address_len <= prefix_len + suffix_len
        || prefix_len >= address_len
        || suffix_len >= address_len
    {
        return address.to_string();
    }

    let prefix = &address[..prefix_len];
    let suffix = &address[address_len - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Short display form of an account: `0xabc...1234`.
pub fn short_address(address: &str) -> String {
    format_address(address, 5, 4)
}
