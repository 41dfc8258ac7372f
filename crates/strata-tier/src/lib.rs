//! # strata-tier
//!
//! Tiered content storage: decides whether a content hash is served from the
//! local store or the remote store, verifies the chosen copy is reachable,
//! and repairs missing local copies before giving up.
//!
//! ## Read path
//!
//! ```text
//! FileRef ──► TierResolver ──► StoragePath ──► read-guard ──► bytes / handle
//!               │ ledger lookup                 │ local? check + recovery
//!               │ policy (prefer_remote)        │ remote? pass through
//! ```
//!
//! Resolution is total: it always yields a candidate path and never touches
//! the filesystem. Readability is where I/O and failure live. The guard is
//! the only place an unreadable copy becomes a hard error.
//!
//! ## Sequencing
//!
//! Every readability check runs in this order, whatever thread it runs on:
//! external sync → local check → recovery → local re-check → remote check.
//! There is no locking against concurrent migration; a resolved tier may go
//! stale between resolution and the read.

mod error;
mod file_ref;
mod path;
pub mod readability;
pub mod recovery;
pub mod remote;
pub mod resolver;
pub mod storage;

pub use error::{TierError, Transfer};
pub use file_ref::{FileRef, StoredFile};
pub use path::StoragePath;
pub use readability::{LocalReadability, Readability, ReadabilityEngine};
pub use recovery::{NoRecovery, Recovery, RecoveryOutcome, RemoteRecovery};
pub use remote::{MirrorRemote, RemoteError, RemoteStore, REMOTE_SCHEME};
pub use resolver::TierResolver;
pub use storage::{FileStorage, Handle, LocalFileStorage, TieredStorage};

pub use strata_cas::{CasStore, ContentHash};
pub use strata_config::TierPolicy;
pub use strata_ledger::{LocationLedger, Lookup, Tier};

pub type Result<T> = std::result::Result<T, TierError>;
