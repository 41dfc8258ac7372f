//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - Isolated local store root
//! - Isolated remote mirror root
//! - Isolated ledger directory
//!
//! # Usage
//!
//! ```ignore
//! use strata_config::testing::TestEnvironment;
//!
//! let env = TestEnvironment::new()?;
//! let config = env.config(false);
//! // config.storage.local_root, config.remote.root, config.ledger.path are isolated
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

use crate::{Config, TierPolicy};

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with unique paths
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Local store root
    pub local_root: PathBuf,
    /// Remote mirror root
    pub remote_root: PathBuf,
    /// Ledger environment directory
    pub ledger_dir: PathBuf,
    /// Scratch directory for input files
    pub scratch: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        let local_root = root.join("local");
        let remote_root = root.join("remote");
        let ledger_dir = root.join("ledger");
        let scratch = root.join("scratch");

        for dir in [&local_root, &remote_root, &ledger_dir, &scratch] {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self {
            _temp_dir: temp_dir,
            local_root,
            remote_root,
            ledger_dir,
            scratch,
            test_id,
        })
    }

    /// Config pointing every store at this environment.
    pub fn config(&self, prefer_remote: bool) -> Config {
        let mut cfg = Config::default();
        cfg.storage.local_root = self.local_root.clone();
        cfg.remote.root = self.remote_root.clone();
        cfg.ledger.path = self.ledger_dir.clone();
        cfg.policy = TierPolicy::prefer_remote(prefer_remote);
        cfg
    }

    /// Create a scratch file with content
    pub fn create_file(&self, relative_path: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.scratch.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }
}
