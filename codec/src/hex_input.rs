//! Lenient hex parsing for bytes coming back from HTTP services.

use crate::CodecError;

/// Decode a hex string with or without a `0x` prefix.
///
/// An empty string (or a bare `0x`) decodes to an empty vector; callers that
/// require content check for emptiness themselves.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, CodecError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| CodecError::InvalidHex(e.to_string()))
}
