//! Tier resolution.
//!
//! Maps a content hash to the one path a read should use. Pure with respect
//! to the filesystem: the only I/O is the ledger lookup, and a failed lookup
//! degrades to the policy's fallback tier instead of an error.

use std::path::PathBuf;
use std::sync::Arc;

use strata_cas::{CasStore, ContentHash};
use strata_config::{log_resolve_debug, log_resolve_warn, TierPolicy};
use strata_ledger::{LocationLedger, Lookup, Tier};

use crate::{FileRef, RemoteStore, StoragePath};

pub struct TierResolver {
    local: CasStore,
    remote: Arc<dyn RemoteStore>,
    ledger: Arc<dyn LocationLedger>,
    policy: TierPolicy,
}

impl TierResolver {
    pub fn new(
        local: CasStore,
        remote: Arc<dyn RemoteStore>,
        ledger: Arc<dyn LocationLedger>,
        policy: TierPolicy,
    ) -> Self {
        Self {
            local,
            remote,
            ledger,
            policy,
        }
    }

    pub fn policy(&self) -> TierPolicy {
        self.policy
    }

    pub fn local_path(&self, hash: &ContentHash) -> PathBuf {
        self.local.blob_path(hash)
    }

    pub fn remote_path(&self, hash: &ContentHash) -> StoragePath {
        self.remote.path_for(hash)
    }

    /// Tier for `hash` after applying the absent/unknown fallbacks.
    ///
    /// Read fresh from the ledger on every call.
    pub fn effective_tier(&self, hash: &ContentHash) -> Tier {
        match self.ledger.lookup(hash) {
            Ok(Lookup::Tier(tier)) => tier,
            Ok(Lookup::Absent) => self.policy.absent_tier,
            Ok(Lookup::Unknown(code)) => {
                log_resolve_warn!(
                    "Unrecognized ledger code, using fallback tier",
                    hash = hash.as_str(),
                    code = code,
                    fallback = self.policy.unknown_tier.as_str(),
                );
                self.policy.unknown_tier
            }
            Err(e) => {
                log_resolve_warn!(
                    "Ledger lookup failed, using fallback tier",
                    hash = hash.as_str(),
                    error = e.to_string().as_str(),
                    fallback = self.policy.unknown_tier.as_str(),
                );
                self.policy.unknown_tier
            }
        }
    }

    /// Authoritative read path for `hash`. Never fails.
    pub fn resolve_path(&self, hash: &ContentHash) -> StoragePath {
        let tier = self.effective_tier(hash);
        let remote = match tier {
            Tier::Local => false,
            Tier::External => true,
            Tier::Duplicated => self.policy.prefer_remote,
        };
        log_resolve_debug!(
            "Resolved content path",
            hash = hash.as_str(),
            tier = tier.as_str(),
            remote = remote,
        );
        if remote {
            self.remote_path(hash)
        } else {
            StoragePath::from_local(&self.local_path(hash))
        }
    }

    /// Run the file's external sync, then resolve its hash.
    pub fn resolve_file(&self, file: &dyn FileRef) -> StoragePath {
        sync_file(file);
        self.resolve_path(file.content_hash())
    }
}

/// Trigger the file's external sync; failures are logged, never fatal.
pub(crate) fn sync_file(file: &dyn FileRef) {
    if let Err(e) = file.trigger_external_sync() {
        log_resolve_warn!(
            "External sync failed, continuing with current content",
            hash = file.content_hash().as_str(),
            error = e.to_string().as_str(),
        );
    }
}
