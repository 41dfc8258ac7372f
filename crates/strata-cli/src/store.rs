//! Wiring from [`Config`] to a live [`TieredStorage`].

use std::sync::Arc;

use anyhow::{Context, Result};
use strata_config::Config;
use strata_ledger::LmdbLedger;
use strata_tier::{
    CasStore, ContentHash, MirrorRemote, NoRecovery, Recovery, RemoteRecovery, RemoteStore,
    TieredStorage,
};

/// Every store the commands touch, opened from one config.
pub struct Store {
    pub local: CasStore,
    pub remote: Arc<MirrorRemote>,
    pub ledger: Arc<LmdbLedger>,
    pub storage: TieredStorage,
}

impl Store {
    pub fn open(config: &Config) -> Result<Self> {
        let local = CasStore::new(&config.storage.local_root).with_context(|| {
            format!("Failed to open local store at {:?}", config.storage.local_root)
        })?;
        let remote = Arc::new(
            MirrorRemote::new(&config.remote.root)
                .with_context(|| format!("Failed to open remote at {:?}", config.remote.root))?,
        );
        let ledger = Arc::new(
            LmdbLedger::open(&config.ledger.path)
                .with_context(|| format!("Failed to open ledger at {:?}", config.ledger.path))?,
        );
        let recovery: Arc<dyn Recovery> = if config.recovery.from_remote {
            Arc::new(RemoteRecovery::new(remote.clone()))
        } else {
            Arc::new(NoRecovery)
        };

        let storage = TieredStorage::new(
            local.clone(),
            remote.clone(),
            ledger.clone(),
            recovery,
            config.policy,
        );

        Ok(Self {
            local,
            remote,
            ledger,
            storage,
        })
    }

    /// Whether the remote currently holds a readable copy of `hash`.
    pub fn remote_holds(&self, hash: &ContentHash) -> bool {
        self.remote.is_readable(&self.remote.path_for(hash))
    }
}
