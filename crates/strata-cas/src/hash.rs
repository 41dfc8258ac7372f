//! Content hash identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CasError;

/// Shortest accepted digest, in hex chars (SHA-1 sized).
pub const MIN_HEX_LEN: usize = 40;

/// Longest accepted digest, in hex chars (SHA-512 sized).
pub const MAX_HEX_LEN: usize = 128;

/// Opaque identifier of immutable byte content.
///
/// Stored as lowercase hex. The store trusts the hash: two blobs with the
/// same `ContentHash` are assumed to hold the same bytes and are never
/// re-verified on read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash `data` with BLAKE3.
    pub fn of(data: &[u8]) -> Self {
        Self(blake3::hash(data).to_hex().to_string())
    }

    /// Parse a hex digest, normalizing to lowercase.
    pub fn parse(hex_str: &str) -> Result<Self, CasError> {
        let len = hex_str.len();
        if !(MIN_HEX_LEN..=MAX_HEX_LEN).contains(&len) || len % 2 != 0 {
            return Err(CasError::InvalidHash(hex_str.to_string()));
        }
        let lower = hex_str.to_ascii_lowercase();
        hex::decode(&lower).map_err(|_| CasError::InvalidHash(hex_str.to_string()))?;
        Ok(Self(lower))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First two fan-out levels (`ab`, `cd`).
    pub(crate) fn shards(&self) -> (&str, &str) {
        (&self.0[..2], &self.0[2..4])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = CasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = CasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}
