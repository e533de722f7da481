//! Fixed-width 32-byte values: protocol tags and Merkle hashes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::TypesError;

/// Attestation type handled by the engine.
pub const ATTESTATION_TYPE_WEB2_JSON: &str = "Web2Json";

/// Source the verifier fetches from.
pub const SOURCE_ID_PUBLIC_WEB2: &str = "PublicWeb2";

/// A Solidity `bytes32`.
///
/// Protocol tags are packed as the ASCII bytes first, zero-filled up to 32
/// bytes. Serialized as a `0x`-prefixed hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bytes32([u8; 32]);

impl Bytes32 {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Pack an ASCII tag. Fails if the tag does not fit.
    pub fn from_ascii(tag: &str) -> Result<Self, TypesError> {
        let raw = tag.as_bytes();
        if raw.len() > 32 {
            return Err(TypesError::TagTooLong(tag.to_string()));
        }
        let mut bytes = [0u8; 32];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    /// Parse a `0x`-prefixed (or bare) 64-char hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| TypesError::InvalidHex(format!("expected 32 bytes, got {s}")))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x` + 64 lowercase hex chars, the form the verifier API expects.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The tag text with trailing zero bytes stripped, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(32);
        std::str::from_utf8(&self.0[..end]).ok()
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "Bytes32({text:?})"),
            None => write!(f, "Bytes32({})", self.to_hex()),
        }
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
