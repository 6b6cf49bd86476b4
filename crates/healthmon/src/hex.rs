//! Decoding of the `0x`-prefixed quantities returned by JSON-RPC nodes.

use crate::error::HexError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn strip_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Best-effort decoding: anything that is not a valid quantity yields 0.
///
/// Malformed input is logged and never propagated, so a single bad field in a
/// sync report can not abort the caller.
pub fn parse_hex_uint(text: &str) -> u64 {
    if strip_prefix(text).is_empty() {
        return 0;
    }

    match parse_hex_uint_strict(text) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("error parsing hex '{}': {}, defaulting to 0", text, err);
            0
        }
    }
}

/// Strict decoding for values that must not be silently replaced.
pub fn parse_hex_uint_strict(text: &str) -> Result<u64, HexError> {
    let digits = strip_prefix(text);
    if digits.is_empty() {
        return Err(HexError::Empty);
    }
    // from_str_radix accepts a leading sign
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(HexError::InvalidDigit(text.to_string()));
    }

    u64::from_str_radix(digits, 16).map_err(|_| HexError::Overflow(text.to_string()))
}

/// Strictly decodes a hex unix timestamp in seconds.
pub fn parse_hex_timestamp_strict(text: &str) -> Result<SystemTime, HexError> {
    let secs = parse_hex_uint_strict(text)?;
    UNIX_EPOCH
        .checked_add(Duration::from_secs(secs))
        .ok_or_else(|| HexError::Overflow(text.to_string()))
}
