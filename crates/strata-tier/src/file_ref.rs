use std::io;

use strata_cas::ContentHash;

/// A logical file owned by the storage API above this crate.
///
/// Only the content hash, the size and the sync hook are visible here.
pub trait FileRef: Send + Sync {
    fn content_hash(&self) -> &ContentHash;

    fn file_size(&self) -> u64;

    /// Refresh content from an upstream source before it is checked or read.
    ///
    /// Failures are logged by the caller and do not abort the check that
    /// follows.
    fn trigger_external_sync(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Plain file reference with no upstream source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub hash: ContentHash,
    pub size: u64,
}

impl StoredFile {
    pub fn new(hash: ContentHash, size: u64) -> Self {
        Self { hash, size }
    }
}

impl FileRef for StoredFile {
    fn content_hash(&self) -> &ContentHash {
        &self.hash
    }

    fn file_size(&self) -> u64 {
        self.size
    }
}
