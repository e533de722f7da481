//! Spellings of the request bytes accepted by DA deployments.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestEncoding {
    /// `0x0102…`
    HexPrefixed,
    /// `0102…`
    HexBare,
    /// Standard alphabet, padded.
    Base64,
}

/// Order tried when nothing else is configured.
pub const DEFAULT_ENCODINGS: [RequestEncoding; 3] = [
    RequestEncoding::HexPrefixed,
    RequestEncoding::HexBare,
    RequestEncoding::Base64,
];

impl RequestEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            RequestEncoding::HexPrefixed => format!("0x{}", hex::encode(bytes)),
            RequestEncoding::HexBare => hex::encode(bytes),
            RequestEncoding::Base64 => STANDARD.encode(bytes),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestEncoding::HexPrefixed => "hex-prefixed",
            RequestEncoding::HexBare => "hex-bare",
            RequestEncoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for RequestEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex-prefixed" => Ok(RequestEncoding::HexPrefixed),
            "hex-bare" => Ok(RequestEncoding::HexBare),
            "base64" => Ok(RequestEncoding::Base64),
            other => Err(format!("unknown request encoding: {other}")),
        }
    }
}
