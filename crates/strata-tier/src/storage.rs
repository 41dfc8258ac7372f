//! Read-path storage API.
//!
//! [`LocalFileStorage`] is the plain local-only implementation.
//! [`TieredStorage`] wraps one and adds tier resolution, the read-guard and
//! the migration primitives, behind the same [`FileStorage`] interface.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::Arc;

use strata_cas::{CasStore, ContentHash};
use strata_config::{log_copy_info, log_copy_warn, log_read_debug, log_read_error, TierPolicy};
use strata_ledger::LocationLedger;

use crate::readability::{Readability, ReadabilityEngine};
use crate::recovery::Recovery;
use crate::resolver::TierResolver;
use crate::{FileRef, RemoteStore, Result, StoragePath, TierError, Transfer};

/// Open stream over one copy of a file's content.
pub enum Handle {
    Local(File),
    Remote(Box<dyn Read + Send>),
}

impl Handle {
    pub fn is_remote(&self) -> bool {
        matches!(self, Handle::Remote(_))
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Handle::Local(file) => file.read(buf),
            Handle::Remote(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Local(file) => f.debug_tuple("Local").field(file).finish(),
            Handle::Remote(_) => f.write_str("Remote(..)"),
        }
    }
}

/// Content reads keyed by file reference.
pub trait FileStorage: Send + Sync {
    /// Open the content for streaming.
    fn open_handle(&self, file: &dyn FileRef) -> Result<Handle>;

    /// Stream the whole content into `out`. Returns bytes written.
    fn send_file(&self, file: &dyn FileRef, out: &mut dyn Write) -> Result<u64> {
        let mut handle = self.open_handle(file)?;
        Ok(io::copy(&mut handle, out)?)
    }

    /// Read the whole content into memory.
    fn read_all_bytes(&self, file: &dyn FileRef) -> Result<Vec<u8>> {
        let mut handle = self.open_handle(file)?;
        let mut data = Vec::with_capacity(file.file_size().min(64 * 1024 * 1024) as usize);
        handle.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Local-only storage over a [`CasStore`].
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    cas: CasStore,
}

impl LocalFileStorage {
    pub fn new(cas: CasStore) -> Self {
        Self { cas }
    }

    pub fn cas(&self) -> &CasStore {
        &self.cas
    }
}

impl FileStorage for LocalFileStorage {
    fn open_handle(&self, file: &dyn FileRef) -> Result<Handle> {
        Ok(Handle::Local(self.cas.open(file.content_hash())?))
    }

    fn read_all_bytes(&self, file: &dyn FileRef) -> Result<Vec<u8>> {
        Ok(self.cas.read(file.content_hash())?)
    }
}

/// Tier-aware storage: resolves each read to the local or remote copy.
pub struct TieredStorage {
    inner: LocalFileStorage,
    remote: Arc<dyn RemoteStore>,
    resolver: TierResolver,
    engine: ReadabilityEngine,
}

impl TieredStorage {
    pub fn new(
        local: CasStore,
        remote: Arc<dyn RemoteStore>,
        ledger: Arc<dyn LocationLedger>,
        recovery: Arc<dyn Recovery>,
        policy: TierPolicy,
    ) -> Self {
        Self {
            resolver: TierResolver::new(local.clone(), remote.clone(), ledger, policy),
            engine: ReadabilityEngine::new(local.clone(), remote.clone(), recovery),
            inner: LocalFileStorage::new(local),
            remote,
        }
    }

    pub fn local(&self) -> &CasStore {
        self.inner.cas()
    }

    pub fn resolver(&self) -> &TierResolver {
        &self.resolver
    }

    pub fn engine(&self) -> &ReadabilityEngine {
        &self.engine
    }

    pub fn resolve_path(&self, hash: &ContentHash) -> StoragePath {
        self.resolver.resolve_path(hash)
    }

    pub fn is_readable(&self, file: &dyn FileRef) -> bool {
        self.engine.is_readable(file)
    }

    pub fn check_readable(&self, file: &dyn FileRef) -> Readability {
        self.engine.check_readable(file)
    }

    pub fn is_readable_by_hash(&self, hash: &ContentHash) -> bool {
        self.engine.is_readable_by_hash(hash)
    }

    pub fn ensure_readable_or_fail(&self, file: &dyn FileRef, resolved: &StoragePath) -> Result<()> {
        self.engine.ensure_readable_or_fail(file, resolved)
    }

    /// Upload the local copy. The local copy must pass the readability check
    /// (with recovery) first; otherwise nothing is copied.
    pub fn try_copy_local_to_remote(&self, hash: &ContentHash) -> Result<u64> {
        let local_path = self.require_local(hash)?;
        let remote_path = self.resolver.remote_path(hash);
        let bytes = self
            .remote
            .upload(&local_path, &remote_path)
            .map_err(|e| TierError::copy_failed(hash, Transfer::Upload, e))?;
        log_copy_info!("Uploaded local copy", hash = hash.as_str(), bytes = bytes);
        Ok(bytes)
    }

    /// Download the remote copy. Remote existence is the caller's concern.
    pub fn try_copy_remote_to_local(&self, hash: &ContentHash) -> Result<u64> {
        let local_path = self.resolver.local_path(hash);
        let remote_path = self.resolver.remote_path(hash);
        let bytes = self
            .remote
            .download(&remote_path, &local_path)
            .map_err(|e| TierError::copy_failed(hash, Transfer::Download, e))?;
        log_copy_info!("Downloaded remote copy", hash = hash.as_str(), bytes = bytes);
        Ok(bytes)
    }

    /// Remove the local copy after it passes the readability check.
    ///
    /// Whether the hash has another copy is the caller's decision; this never
    /// consults the ledger.
    pub fn try_delete_local(&self, hash: &ContentHash) -> Result<()> {
        self.require_local(hash)?;
        self.local()
            .delete(hash)
            .map_err(|e| TierError::copy_failed(hash, Transfer::DeleteLocal, e))?;
        log_copy_info!("Deleted local copy", hash = hash.as_str());
        Ok(())
    }

    pub fn copy_local_to_remote(&self, hash: &ContentHash) -> bool {
        report(hash, Transfer::Upload, self.try_copy_local_to_remote(hash).map(|_| ()))
    }

    pub fn copy_remote_to_local(&self, hash: &ContentHash) -> bool {
        report(hash, Transfer::Download, self.try_copy_remote_to_local(hash).map(|_| ()))
    }

    pub fn delete_local(&self, hash: &ContentHash) -> bool {
        report(hash, Transfer::DeleteLocal, self.try_delete_local(hash))
    }

    fn require_local(&self, hash: &ContentHash) -> Result<std::path::PathBuf> {
        let local_path = self.resolver.local_path(hash);
        if self.engine.local_readable_with_recovery(hash).readable {
            Ok(local_path)
        } else {
            Err(TierError::ContentUnreadable {
                hash: hash.clone(),
                path: local_path,
            })
        }
    }

    /// Resolve (with external sync) and run the read-guard.
    fn prepare(&self, file: &dyn FileRef) -> Result<StoragePath> {
        let resolved = self.resolver.resolve_file(file);
        self.engine.ensure_readable_or_fail(file, &resolved)?;
        Ok(resolved)
    }

    /// Local copies are opened by hash through the wrapped local storage,
    /// never through the resolved string.
    fn open_resolved(&self, file: &dyn FileRef, resolved: &StoragePath) -> Result<Handle> {
        if self.remote.path_is_local(resolved) {
            self.inner.open_handle(file)
        } else {
            Ok(Handle::Remote(self.remote.open(resolved)?))
        }
    }
}

impl FileStorage for TieredStorage {
    fn open_handle(&self, file: &dyn FileRef) -> Result<Handle> {
        let resolved = self.prepare(file)?;
        log_read_debug!("Opening content", path = resolved.as_str());
        self.open_resolved(file, &resolved).map_err(|e| {
            log_read_error!(
                "Read failed after guard",
                hash = file.content_hash().as_str(),
                error = e.to_string().as_str(),
            );
            e
        })
    }

    fn read_all_bytes(&self, file: &dyn FileRef) -> Result<Vec<u8>> {
        let resolved = self.prepare(file)?;
        if self.remote.path_is_local(&resolved) {
            return self.inner.read_all_bytes(file);
        }
        let mut data = Vec::new();
        self.remote.open(&resolved)?.read_to_end(&mut data)?;
        Ok(data)
    }
}

fn report(hash: &ContentHash, op: Transfer, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log_copy_warn!(
                "Tier transfer failed",
                hash = hash.as_str(),
                op = op.to_string().as_str(),
                error = e.to_string().as_str(),
            );
            false
        }
    }
}
