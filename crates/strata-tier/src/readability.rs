//! Readability verification with recovery.
//!
//! Checks are booleans, never errors. The one exception is
//! [`ReadabilityEngine::ensure_readable_or_fail`], the read-guard, which turns
//! an unreadable local copy into [`TierError::ContentUnreadable`] before a
//! read would hit a less useful low-level I/O error.

use std::sync::Arc;

use strata_cas::{CasStore, ContentHash};
use strata_config::{log_read_warn, log_recovery_info, log_recovery_warn};

use crate::recovery::{Recovery, RecoveryOutcome};
use crate::resolver::sync_file;
use crate::{FileRef, RemoteStore, StoragePath, TierError};

/// Local half of a readability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalReadability {
    pub readable: bool,
    pub recovery: RecoveryOutcome,
}

/// Full readability report for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readability {
    pub local: LocalReadability,
    /// `None` when the local copy was readable and the remote was never asked
    pub remote: Option<bool>,
}

impl Readability {
    pub fn is_readable(&self) -> bool {
        self.local.readable || self.remote == Some(true)
    }
}

pub struct ReadabilityEngine {
    local: CasStore,
    remote: Arc<dyn RemoteStore>,
    recovery: Arc<dyn Recovery>,
}

impl ReadabilityEngine {
    pub fn new(local: CasStore, remote: Arc<dyn RemoteStore>, recovery: Arc<dyn Recovery>) -> Self {
        Self {
            local,
            remote,
            recovery,
        }
    }

    /// Local check, then one recovery attempt and a re-check if needed.
    pub fn local_readable_with_recovery(&self, hash: &ContentHash) -> LocalReadability {
        if self.local.is_readable(hash) {
            return LocalReadability {
                readable: true,
                recovery: RecoveryOutcome::NotAttempted,
            };
        }

        let local_path = self.local.blob_path(hash);
        if let Err(e) = self.recovery.recover(hash, &local_path) {
            log_recovery_warn!(
                "Recovery procedure reported an error",
                hash = hash.as_str(),
                error = e.to_string().as_str(),
            );
        }

        let readable = self.local.is_readable(hash);
        let recovery = if readable {
            log_recovery_info!("Local copy restored", hash = hash.as_str());
            RecoveryOutcome::Restored
        } else {
            log_recovery_warn!(
                "Local copy still unreadable after recovery",
                hash = hash.as_str(),
                path = &*local_path.to_string_lossy(),
            );
            RecoveryOutcome::Failed
        };
        LocalReadability { readable, recovery }
    }

    /// Full check for a file: sync, local + recovery, then remote only if
    /// the local copy is gone.
    pub fn check_readable(&self, file: &dyn FileRef) -> Readability {
        sync_file(file);
        let hash = file.content_hash();
        let local = self.local_readable_with_recovery(hash);
        let remote = if local.readable {
            None
        } else {
            Some(self.remote.is_readable(&self.remote.path_for(hash)))
        };
        Readability { local, remote }
    }

    pub fn is_readable(&self, file: &dyn FileRef) -> bool {
        self.check_readable(file).is_readable()
    }

    /// Either tier readable, by hash alone. No sync, no recovery, no writes.
    pub fn is_readable_by_hash(&self, hash: &ContentHash) -> bool {
        self.local.is_readable(hash) || self.remote.is_readable(&self.remote.path_for(hash))
    }

    /// Read-guard run between resolution and the physical read.
    ///
    /// Only local paths are checked (with recovery). Remote paths pass
    /// through untouched; a missing remote object surfaces from the remote
    /// client during the read itself.
    pub fn ensure_readable_or_fail(
        &self,
        file: &dyn FileRef,
        resolved: &StoragePath,
    ) -> Result<(), TierError> {
        if !self.remote.path_is_local(resolved) {
            return Ok(());
        }
        let hash = file.content_hash();
        if self.local_readable_with_recovery(hash).readable {
            return Ok(());
        }
        let path = self.local.blob_path(hash);
        log_read_warn!(
            "Refusing to read unreadable local copy",
            hash = hash.as_str(),
            path = &*path.to_string_lossy(),
        );
        Err(TierError::ContentUnreadable {
            hash: hash.clone(),
            path,
        })
    }
}
