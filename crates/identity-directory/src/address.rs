//! Address helpers.

use crate::{DirectoryError, DirectoryResult};

/// Trim `raw` and check it can be used as a path segment.
///
/// Bech32 and hex addresses are plain ASCII alphanumerics.
pub fn validate_address(raw: &str) -> DirectoryResult<&str> {
    let address = raw.trim();
    if address.is_empty() || !address.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DirectoryError::InvalidAddress(raw.to_string()));
    }
    Ok(address)
}

/// `cosmos1abcdefghij` → `cosmos...efghij` for `part_len` 6.
///
/// Addresses too short to gain anything are returned unchanged.
pub fn shorten_address(address: &str, part_len: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= part_len * 2 + 3 {
        return address.to_string();
    }
    let head: String = chars[..part_len].iter().collect();
    let tail: String = chars[chars.len() - part_len..].iter().collect();
    format!("{}...{}", head, tail)
}
