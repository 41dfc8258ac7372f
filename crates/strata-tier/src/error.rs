use std::fmt;
use std::io;
use std::path::PathBuf;

use strata_cas::{CasError, ContentHash};
use thiserror::Error;

use crate::remote::RemoteError;

/// Byte movement between tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Local → remote
    Upload,
    /// Remote → local
    Download,
    /// Removal of the local copy
    DeleteLocal,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transfer::Upload => write!(f, "upload"),
            Transfer::Download => write!(f, "download"),
            Transfer::DeleteLocal => write!(f, "delete-local"),
        }
    }
}

/// Errors surfaced by tiered storage operations
#[derive(Error, Debug)]
pub enum TierError {
    /// A local copy failed the readability check, recovery included.
    /// `path` is the storage-facing local path, not the resolved one.
    #[error("Content {hash} is unreadable at {}", path.display())]
    ContentUnreadable { hash: ContentHash, path: PathBuf },

    #[error("{op} of {hash} failed: {reason}")]
    CopyFailed {
        hash: ContentHash,
        op: Transfer,
        reason: String,
    },

    #[error("CAS error: {0}")]
    Cas(#[from] CasError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TierError {
    pub(crate) fn copy_failed(hash: &ContentHash, op: Transfer, reason: impl fmt::Display) -> Self {
        TierError::CopyFailed {
            hash: hash.clone(),
            op,
            reason: reason.to_string(),
        }
    }
}
