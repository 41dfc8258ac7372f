//! # strata-config
//!
//! Configuration management for Strata.
//!
//! Loads configuration from:
//! 1. `~/.strata/config.toml` (global)
//! 2. `.strata/config.toml` (project-local, overrides global key by key)
//! 3. Environment variables (highest priority)
//!
//! There is no process-wide config instance. Callers load a [`Config`] once
//! and hand the relevant sections to the components they construct.

pub mod logging;
pub mod testing;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub use strata_ledger::Tier;

/// Tier assumed for a hash with no ledger entry (never migrated).
pub const DEFAULT_ABSENT_TIER: Tier = Tier::Local;

/// Tier assumed when the ledger holds a code this build does not recognize,
/// or cannot be read at all.
pub const DEFAULT_UNKNOWN_TIER: Tier = Tier::Local;

/// Project-local config location, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".strata/config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub policy: TierPolicy,
    pub ledger: LedgerConfig,
    pub recovery: RecoveryConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let global = Self::global_config_path();
        let mut config = Self::load_from(global.as_deref(), Some(Path::new(PROJECT_CONFIG_PATH)))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load and layer the given files; missing files are skipped.
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        for path in [global, project].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)?;
            let layer: toml::Value = toml::from_str(&contents)?;
            merge_toml(&mut merged, layer);
        }
        Ok(merged.try_into()?)
    }

    /// Global config path: ~/.strata/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".strata/config.toml"))
    }

    /// Apply environment-style overrides through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STRATA_LOCAL_ROOT") {
            self.storage.local_root = PathBuf::from(path);
        }
        if let Some(path) = lookup("STRATA_REMOTE_ROOT") {
            self.remote.root = PathBuf::from(path);
        }
        if let Some(path) = lookup("STRATA_LEDGER") {
            self.ledger.path = PathBuf::from(path);
        }
        if let Some(flag) = lookup("STRATA_PREFER_REMOTE") {
            match parse_flag(&flag) {
                Some(b) => self.policy.prefer_remote = b,
                None => tracing::warn!(value = flag.as_str(), "ignoring STRATA_PREFER_REMOTE"),
            }
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        Config::default().to_toml().unwrap_or_default()
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, everything
/// else replaces.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn strata_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".strata")
}

/// Local store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the sharded local blob tree
    pub local_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_root: strata_home().join("local"),
        }
    }
}

/// Remote store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Root of the mirrored object tree (mounted bucket or shared volume)
    pub root: PathBuf,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            root: strata_home().join("remote"),
        }
    }
}

/// Resolution policy, fixed for the lifetime of a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
    /// Serve the remote copy when a hash is duplicated across tiers
    pub prefer_remote: bool,
    /// Tier assumed for hashes with no ledger entry
    pub absent_tier: Tier,
    /// Tier assumed for unrecognized or unreadable ledger entries
    pub unknown_tier: Tier,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            prefer_remote: false,
            absent_tier: DEFAULT_ABSENT_TIER,
            unknown_tier: DEFAULT_UNKNOWN_TIER,
        }
    }
}

impl TierPolicy {
    pub fn prefer_remote(prefer_remote: bool) -> Self {
        Self {
            prefer_remote,
            ..Self::default()
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// LMDB environment directory
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: strata_home().join("ledger"),
        }
    }
}

/// Recovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Restore missing local copies by downloading the remote copy
    pub from_remote: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { from_remote: true }
    }
}
