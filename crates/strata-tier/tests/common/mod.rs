//! Shared doubles for tiered storage integration tests.

#![allow(dead_code)]

use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_ledger::MemoryLedger;
use strata_tier::remote::RemoteResult;
use strata_tier::{
    CasStore, ContentHash, FileRef, MirrorRemote, Recovery, RemoteStore, StoragePath,
    TierPolicy, TieredStorage,
};
use tempfile::TempDir;

/// Mirror remote that counts every call made against it.
pub struct CountingRemote {
    inner: MirrorRemote,
    pub calls: AtomicUsize,
    pub uploads: AtomicUsize,
}

impl CountingRemote {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: MirrorRemote::new(root).unwrap(),
            calls: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.uploads.store(0, Ordering::SeqCst);
    }

    /// Place `data` in the remote without going through the counters.
    pub fn seed(&self, hash: &ContentHash, data: &[u8]) {
        let path = self.inner.fs_path(&self.inner.path_for(hash)).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    pub fn holds(&self, hash: &ContentHash) -> bool {
        self.inner.is_readable(&self.inner.path_for(hash))
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl RemoteStore for CountingRemote {
    fn path_for(&self, hash: &ContentHash) -> StoragePath {
        self.tick();
        self.inner.path_for(hash)
    }

    fn is_readable(&self, path: &StoragePath) -> bool {
        self.tick();
        self.inner.is_readable(path)
    }

    // Namespace classification is pure string inspection; not counted.
    fn path_is_local(&self, path: &StoragePath) -> bool {
        self.inner.path_is_local(path)
    }

    fn upload(&self, local: &Path, remote: &StoragePath) -> RemoteResult<u64> {
        self.tick();
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.inner.upload(local, remote)
    }

    fn download(&self, remote: &StoragePath, local: &Path) -> RemoteResult<u64> {
        self.tick();
        self.inner.download(remote, local)
    }

    fn open(&self, remote: &StoragePath) -> RemoteResult<Box<dyn Read + Send>> {
        self.tick();
        self.inner.open(remote)
    }
}

/// Recovery double that writes fixed bytes, or nothing.
pub struct SeedRecovery {
    data: Option<Vec<u8>>,
    pub attempts: AtomicUsize,
}

impl SeedRecovery {
    pub fn restoring(data: &[u8]) -> Self {
        Self {
            data: Some(data.to_vec()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            data: None,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Recovery for SeedRecovery {
    fn recover(&self, _hash: &ContentHash, local_path: &Path) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.data {
            Some(data) => {
                std::fs::create_dir_all(local_path.parent().unwrap())?;
                std::fs::write(local_path, data)
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no upstream copy")),
        }
    }
}

/// File reference that counts external sync calls.
pub struct SyncedFile {
    pub hash: ContentHash,
    pub size: u64,
    pub syncs: AtomicUsize,
    pub fail_sync: bool,
}

impl SyncedFile {
    pub fn new(hash: ContentHash, size: u64) -> Self {
        Self {
            hash,
            size,
            syncs: AtomicUsize::new(0),
            fail_sync: false,
        }
    }

    pub fn syncs(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

impl FileRef for SyncedFile {
    fn content_hash(&self) -> &ContentHash {
        &self.hash
    }

    fn file_size(&self) -> u64 {
        self.size
    }

    fn trigger_external_sync(&self) -> io::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync {
            Err(io::Error::other("upstream unreachable"))
        } else {
            Ok(())
        }
    }
}

/// Fully wired storage over temp directories.
pub struct Harness {
    _temp: TempDir,
    pub local: CasStore,
    pub remote: Arc<CountingRemote>,
    pub ledger: Arc<MemoryLedger>,
    pub recovery: Arc<SeedRecovery>,
    pub storage: TieredStorage,
}

impl Harness {
    pub fn new(prefer_remote: bool, recovery: SeedRecovery) -> Self {
        let temp = TempDir::new().unwrap();
        let local = CasStore::new(temp.path().join("local")).unwrap();
        let remote = Arc::new(CountingRemote::new(&temp.path().join("remote")));
        let ledger = Arc::new(MemoryLedger::new());
        let recovery = Arc::new(recovery);
        let storage = TieredStorage::new(
            local.clone(),
            remote.clone(),
            ledger.clone(),
            recovery.clone(),
            TierPolicy::prefer_remote(prefer_remote),
        );
        Self {
            _temp: temp,
            local,
            remote,
            ledger,
            recovery,
            storage,
        }
    }

    pub fn local_path(&self, hash: &ContentHash) -> StoragePath {
        StoragePath::from_local(&self.local.blob_path(hash))
    }
}
