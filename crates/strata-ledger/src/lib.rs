//! # strata-ledger
//!
//! Location ledger for tiered content storage.
//!
//! The ledger records, per content hash, which physical tier currently holds
//! the bytes. It is written by migration tooling and read by the resolver.
//! A hash with no entry has never been migrated and lives only locally.
//!
//! ## Backends
//!
//! - [`MemoryLedger`]: concurrent in-process map (tests, embedding)
//! - [`LmdbLedger`]: LMDB-backed, crash-safe, shared across processes

pub mod lmdb;
pub mod memory;

pub use lmdb::LmdbLedger;
pub use memory::MemoryLedger;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use strata_cas::ContentHash;

/// Ledger errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Physical placement of a hash's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Tier {
    /// Only in the local store
    Local = 0,
    /// Only in the remote store
    External = 1,
    /// Present in both
    Duplicated = 2,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Local, Tier::External, Tier::Duplicated];

    /// One-byte persisted code.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Tier::Local),
            1 => Some(Tier::External),
            2 => Some(Tier::Duplicated),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Local => "local",
            Tier::External => "external",
            Tier::Duplicated => "duplicated",
        }
    }

    /// Whether a local copy is expected to exist.
    pub fn has_local(self) -> bool {
        matches!(self, Tier::Local | Tier::Duplicated)
    }

    /// Whether a remote copy is expected to exist.
    pub fn has_remote(self) -> bool {
        matches!(self, Tier::External | Tier::Duplicated)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Tier::Local),
            "external" => Ok(Tier::External),
            "duplicated" => Ok(Tier::Duplicated),
            other => Err(format!(
                "unknown tier {other:?} (expected local, external or duplicated)"
            )),
        }
    }
}

/// Result of a ledger lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No entry for this hash
    Absent,
    /// A recognized tier
    Tier(Tier),
    /// An entry whose code this build does not understand
    Unknown(u8),
}

impl Lookup {
    pub fn from_code(code: Option<u8>) -> Self {
        match code {
            None => Lookup::Absent,
            Some(c) => Tier::from_code(c).map_or(Lookup::Unknown(c), Lookup::Tier),
        }
    }
}

/// Persisted mapping content hash → tier.
///
/// Implementations must be safe to share across threads; resolution runs
/// concurrently for many files.
pub trait LocationLedger: Send + Sync {
    /// Look up the raw entry for `hash`.
    fn lookup(&self, hash: &ContentHash) -> LedgerResult<Lookup>;

    /// Record the tier for `hash`, replacing any previous entry.
    fn record(&self, hash: &ContentHash, tier: Tier) -> LedgerResult<()>;

    /// Drop the entry for `hash`. Returns `true` if one existed.
    fn forget(&self, hash: &ContentHash) -> LedgerResult<bool>;

    /// Recognized tier for `hash`, `None` when absent or unrecognized.
    fn get_tier(&self, hash: &ContentHash) -> LedgerResult<Option<Tier>> {
        Ok(match self.lookup(hash)? {
            Lookup::Tier(tier) => Some(tier),
            Lookup::Absent | Lookup::Unknown(_) => None,
        })
    }
}

impl<L: LocationLedger + ?Sized> LocationLedger for std::sync::Arc<L> {
    fn lookup(&self, hash: &ContentHash) -> LedgerResult<Lookup> {
        (**self).lookup(hash)
    }

    fn record(&self, hash: &ContentHash, tier: Tier) -> LedgerResult<()> {
        (**self).record(hash, tier)
    }

    fn forget(&self, hash: &ContentHash) -> LedgerResult<bool> {
        (**self).forget(hash)
    }
}

/// Per-tier entry counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub local: u64,
    pub external: u64,
    pub duplicated: u64,
    pub unknown: u64,
}

impl TierCounts {
    pub(crate) fn add(&mut self, code: u8) {
        match Tier::from_code(code) {
            Some(Tier::Local) => self.local += 1,
            Some(Tier::External) => self.external += 1,
            Some(Tier::Duplicated) => self.duplicated += 1,
            None => self.unknown += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.local + self.external + self.duplicated + self.unknown
    }
}
