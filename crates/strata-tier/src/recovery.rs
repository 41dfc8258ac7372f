//! Recovery of missing local copies.
//!
//! A [`Recovery`] procedure is handed the hash and the local path that
//! failed its readability check, and may repopulate it. The engine always
//! re-checks the path afterwards; what the procedure reports is advisory.

use std::io;
use std::path::Path;
use std::sync::Arc;

use strata_cas::ContentHash;

use crate::RemoteStore;

/// What happened to a missing local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The local copy was readable; recovery never ran
    NotAttempted,
    /// Recovery ran and the local copy is readable again
    Restored,
    /// Recovery ran and the local copy is still unreadable
    Failed,
}

impl RecoveryOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryOutcome::NotAttempted => "not-attempted",
            RecoveryOutcome::Restored => "restored",
            RecoveryOutcome::Failed => "failed",
        }
    }
}

pub trait Recovery: Send + Sync {
    /// Try to repopulate `local_path` with the content of `hash`.
    fn recover(&self, hash: &ContentHash, local_path: &Path) -> io::Result<()>;
}

/// No recovery source. Missing local copies stay missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecovery;

impl Recovery for NoRecovery {
    fn recover(&self, _hash: &ContentHash, _local_path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Restores local copies by downloading the remote copy, when there is one.
pub struct RemoteRecovery {
    remote: Arc<dyn RemoteStore>,
}

impl RemoteRecovery {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }
}

impl Recovery for RemoteRecovery {
    fn recover(&self, hash: &ContentHash, local_path: &Path) -> io::Result<()> {
        let remote_path = self.remote.path_for(hash);
        if !self.remote.is_readable(&remote_path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no remote copy at {remote_path}"),
            ));
        }
        self.remote
            .download(&remote_path, local_path)
            .map(|_| ())
            .map_err(io::Error::other)
    }
}
