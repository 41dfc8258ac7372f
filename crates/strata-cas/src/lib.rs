//! # strata-cas
//!
//! Local content-addressable blob store for Strata.
//!
//! Blobs are keyed by their [`ContentHash`] and laid out with a 2-level
//! fan-out so no single directory grows unbounded:
//!
//! ```text
//! <root>/
//! └── objects/
//!     └── ab/
//!         └── cd/
//!             └── abcd1234...ef01
//! ```
//!
//! The store never re-hashes content on read. Whatever produced the hash is
//! trusted.

mod hash;

pub use hash::{ContentHash, MAX_HEX_LEN, MIN_HEX_LEN};

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::instrument;

/// Top-level directory holding the fan-out tree.
pub const OBJECTS_DIR: &str = "objects";

/// Errors that can occur during CAS operations
#[derive(Error, Debug)]
pub enum CasError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Blob not found: {hash}")]
    NotFound { hash: String },

    #[error("Invalid content hash: {0:?}")]
    InvalidHash(String),
}

pub type Result<T> = std::result::Result<T, CasError>;

/// Sharded path for `hash` under `root`.
///
/// Shared with any other store that mirrors the local layout.
pub fn sharded_path(root: &Path, hash: &ContentHash) -> PathBuf {
    let (l1, l2) = hash.shards();
    root.join(OBJECTS_DIR).join(l1).join(l2).join(hash.as_str())
}

/// Whether `path` names a regular file this process can open for reading.
pub fn is_readable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => File::open(path).is_ok(),
        _ => false,
    }
}

/// Content-Addressable Storage store backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct CasStore {
    root: PathBuf,
}

impl CasStore {
    /// Create a new CAS store at the given root directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Get the root path of the CAS.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path where the blob for `hash` lives (or would live).
    ///
    /// Deterministic and side-effect free; the file may not exist.
    pub fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        sharded_path(&self.root, hash)
    }

    /// Store bytes in the CAS, returning the content hash.
    ///
    /// If the content already exists, this is a no-op (deduplication).
    /// Writers racing on the same hash each use their own temp file.
    #[instrument(skip(self, data), level = "debug")]
    pub fn store(&self, data: &[u8]) -> Result<ContentHash> {
        let hash = ContentHash::of(data);
        self.store_as(&hash, data)?;
        Ok(hash)
    }

    /// Store a file in the CAS by reading from the filesystem.
    pub fn store_file<P: AsRef<Path>>(&self, path: P) -> Result<ContentHash> {
        let data = fs::read(path)?;
        self.store(&data)
    }

    /// Write `data` under a caller-supplied hash.
    ///
    /// Used when the hash comes from an upstream catalogue rather than from
    /// hashing locally.
    pub fn store_as(&self, hash: &ContentHash, data: &[u8]) -> Result<()> {
        let path = self.blob_path(hash);
        if path.exists() {
            return Ok(());
        }
        write_atomic(&path, data)
    }

    /// Whether the blob for `hash` is present and readable.
    pub fn is_readable(&self, hash: &ContentHash) -> bool {
        is_readable(&self.blob_path(hash))
    }

    /// Check if a blob exists in the CAS.
    pub fn exists(&self, hash: &ContentHash) -> bool {
        self.blob_path(hash).exists()
    }

    /// Retrieve bytes from the CAS by hash.
    #[instrument(skip(self), level = "debug")]
    pub fn read(&self, hash: &ContentHash) -> Result<Vec<u8>> {
        let mut file = self.open(hash)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Open the blob for streaming reads.
    pub fn open(&self, hash: &ContentHash) -> Result<File> {
        let path = self.blob_path(hash);
        File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CasError::NotFound {
                hash: hash.to_string(),
            },
            _ => CasError::Io(e),
        })
    }

    /// Delete a blob from the CAS.
    #[instrument(skip(self), level = "debug")]
    pub fn delete(&self, hash: &ContentHash) -> Result<()> {
        let path = self.blob_path(hash);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CasError::NotFound {
                hash: hash.to_string(),
            }),
            Err(e) => Err(CasError::Io(e)),
        }
    }

    /// Iterate over every blob hash in the store.
    pub fn iter(&self) -> CasIterator {
        CasIterator {
            inner: walkdir::WalkDir::new(self.root.join(OBJECTS_DIR))
                .min_depth(3)
                .max_depth(3)
                .into_iter(),
        }
    }

    /// Get statistics about the CAS.
    pub fn stats(&self) -> Result<CasStats> {
        let mut stats = CasStats::default();
        for hash in self.iter() {
            let hash = hash?;
            let size = fs::metadata(self.blob_path(&hash))?.len();
            stats.blob_count += 1;
            stats.total_bytes += size;
            match size {
                s if s < 1024 => stats.small_blobs += 1,
                s if s < 1024 * 1024 => stats.medium_blobs += 1,
                s if s < 100 * 1024 * 1024 => stats.large_blobs += 1,
                _ => stats.huge_blobs += 1,
            }
        }
        Ok(stats)
    }
}

/// Write `data` to `path` via a unique temp file and rename.
///
/// A concurrent writer that wins the rename is treated as success: the
/// content is the same.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(
        "{}.{}.{:?}.tmp",
        file_name,
        std::process::id(),
        std::thread::current().id()
    ));
    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        if path.exists() {
            return Ok(());
        }
        return Err(CasError::Io(e));
    }
    Ok(())
}

/// Statistics about the CAS store
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CasStats {
    /// Number of unique blobs stored
    pub blob_count: u64,
    /// Total bytes stored (deduplicated)
    pub total_bytes: u64,
    /// Blobs < 1KB
    pub small_blobs: u64,
    /// Blobs 1KB - 1MB
    pub medium_blobs: u64,
    /// Blobs 1MB - 100MB
    pub large_blobs: u64,
    /// Blobs > 100MB
    pub huge_blobs: u64,
}

impl CasStats {
    /// Calculate average blob size
    pub fn avg_blob_size(&self) -> u64 {
        if self.blob_count == 0 {
            0
        } else {
            self.total_bytes / self.blob_count
        }
    }
}

/// Iterator over CAS hashes (`objects/ab/cd/hash`)
pub struct CasIterator {
    inner: walkdir::IntoIter,
}

impl Iterator for CasIterator {
    type Item = Result<ContentHash>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                // Missing objects/ dir means an empty store
                Err(e) if e.io_error().is_some_and(|io| io.kind() == io::ErrorKind::NotFound) => {
                    return None
                }
                Err(e) => return Some(Err(CasError::Io(e.into()))),
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if name.ends_with(".tmp") {
                continue;
            }
            if let Ok(hash) = ContentHash::parse(name) {
                return Some(Ok(hash));
            }
        }
    }
}
