use std::fmt;
use std::path::Path;

/// A path produced by resolution.
///
/// Either a local filesystem path or a remote locator; only the
/// [`RemoteStore`](crate::RemoteStore) decides which namespace it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Wrap a local filesystem path. Lossy; local reads go by hash, not by
    /// this string.
    pub fn from_local(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
