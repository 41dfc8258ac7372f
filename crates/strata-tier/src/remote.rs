//! Remote object store seam.
//!
//! The remote client is an external capability. [`RemoteStore`] is the narrow
//! surface the core consumes; [`MirrorRemote`] is a directory-backed
//! implementation (a mounted bucket or shared volume) that mirrors the local
//! sharded layout.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use strata_cas::{sharded_path, ContentHash};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::StoragePath;

/// URI scheme marking paths that belong to the mirror remote.
pub const REMOTE_SCHEME: &str = "remote://";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Remote object not found: {0}")]
    NotFound(String),

    #[error("Path is not in the remote namespace: {0}")]
    ForeignPath(String),
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Capabilities the core needs from a remote object store.
///
/// Retries, authentication and timeouts belong to the implementation.
pub trait RemoteStore: Send + Sync {
    /// Remote locator for `hash`. Deterministic, no I/O.
    fn path_for(&self, hash: &ContentHash) -> StoragePath;

    /// Whether the object at `path` exists and can be read.
    fn is_readable(&self, path: &StoragePath) -> bool;

    /// Whether `path` belongs to the local namespace rather than this store.
    fn path_is_local(&self, path: &StoragePath) -> bool;

    /// Copy a local file up to `remote`. Returns bytes written.
    fn upload(&self, local: &Path, remote: &StoragePath) -> RemoteResult<u64>;

    /// Copy `remote` down to a local file. Returns bytes written.
    fn download(&self, remote: &StoragePath, local: &Path) -> RemoteResult<u64>;

    /// Open `remote` for streaming reads.
    fn open(&self, remote: &StoragePath) -> RemoteResult<Box<dyn Read + Send>>;
}

impl<R: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<R> {
    fn path_for(&self, hash: &ContentHash) -> StoragePath {
        (**self).path_for(hash)
    }

    fn is_readable(&self, path: &StoragePath) -> bool {
        (**self).is_readable(path)
    }

    fn path_is_local(&self, path: &StoragePath) -> bool {
        (**self).path_is_local(path)
    }

    fn upload(&self, local: &Path, remote: &StoragePath) -> RemoteResult<u64> {
        (**self).upload(local, remote)
    }

    fn download(&self, remote: &StoragePath, local: &Path) -> RemoteResult<u64> {
        (**self).download(remote, local)
    }

    fn open(&self, remote: &StoragePath) -> RemoteResult<Box<dyn Read + Send>> {
        (**self).open(remote)
    }
}

/// Directory-backed remote using the `remote://` scheme.
///
/// `remote://objects/ab/cd/<hash>` maps to `<root>/objects/ab/cd/<hash>`.
#[derive(Debug, Clone)]
pub struct MirrorRemote {
    root: PathBuf,
}

impl MirrorRemote {
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location behind a remote locator.
    ///
    /// Rejects locators outside the scheme and any that would escape the root.
    pub fn fs_path(&self, path: &StoragePath) -> RemoteResult<PathBuf> {
        let rel = path
            .as_str()
            .strip_prefix(REMOTE_SCHEME)
            .ok_or_else(|| RemoteError::ForeignPath(path.to_string()))?;
        let rel = Path::new(rel);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(RemoteError::ForeignPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl RemoteStore for MirrorRemote {
    fn path_for(&self, hash: &ContentHash) -> StoragePath {
        let rel = sharded_path(Path::new(""), hash);
        StoragePath::new(format!("{}{}", REMOTE_SCHEME, rel.to_string_lossy()))
    }

    fn is_readable(&self, path: &StoragePath) -> bool {
        self.fs_path(path)
            .map(|p| strata_cas::is_readable(&p))
            .unwrap_or(false)
    }

    fn path_is_local(&self, path: &StoragePath) -> bool {
        !path.as_str().starts_with(REMOTE_SCHEME)
    }

    #[instrument(skip(self), level = "debug")]
    fn upload(&self, local: &Path, remote: &StoragePath) -> RemoteResult<u64> {
        let dst = self.fs_path(remote)?;
        Ok(copy_atomic(local, &dst)?)
    }

    #[instrument(skip(self), level = "debug")]
    fn download(&self, remote: &StoragePath, local: &Path) -> RemoteResult<u64> {
        let src = self.fs_path(remote)?;
        if !src.is_file() {
            return Err(RemoteError::NotFound(remote.to_string()));
        }
        Ok(copy_atomic(&src, local)?)
    }

    fn open(&self, remote: &StoragePath) -> RemoteResult<Box<dyn Read + Send>> {
        let src = self.fs_path(remote)?;
        match File::open(&src) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(RemoteError::NotFound(remote.to_string()))
            }
            Err(e) => Err(RemoteError::Io(e)),
        }
    }
}

/// Copy `src` to `dst` through a sibling temp file so readers never observe
/// a partial destination. Clones instead of copying where the filesystem
/// supports it.
pub(crate) fn copy_atomic(src: &Path, dst: &Path) -> io::Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dst.with_file_name(format!(
        "{}.{}.{:?}.tmp",
        file_name,
        std::process::id(),
        std::thread::current().id()
    ));

    if let Err(e) = reflink_copy::reflink_or_copy(src, &temp) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&temp, dst) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    let len = fs::metadata(dst)?.len();
    debug!(src = ?src, dst = ?dst, bytes = len, "copied blob");
    Ok(len)
}
