//! LMDB-backed ledger for persistent, crash-safe hash→tier mapping.
//!
//! Every `record`/`forget` commits its own write transaction, so a migration
//! step that returns `Ok` is durable before the next one starts. Readers
//! never block writers.

use std::path::Path;

use heed::types::{Str, U8};
use heed::{Database, Env, EnvOpenOptions};
use tracing::debug;

use crate::{ContentHash, LedgerResult, LocationLedger, Lookup, Tier, TierCounts};

/// LMDB-backed location ledger
pub struct LmdbLedger {
    env: Env,

    /// Hex content hash → tier code
    tiers_db: Database<Str, U8>,
}

impl LmdbLedger {
    /// Default LMDB map size: 256MB (ample for tens of millions of entries)
    const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

    /// Maximum readers
    const MAX_READERS: u32 = 128;

    /// Open or create a ledger in the directory at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is owned by this ledger; no other
        // code in the process maps it with different options.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(Self::DEFAULT_MAP_SIZE)
                .max_readers(Self::MAX_READERS)
                .max_dbs(1)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let tiers_db = env.create_database(&mut wtxn, Some("tiers"))?;
        wtxn.commit()?;

        debug!("Opened LMDB ledger at {:?}", path);

        Ok(Self { env, tiers_db })
    }

    /// Store a raw code, including ones [`Tier`] does not recognize.
    pub fn record_raw(&self, hash: &ContentHash, code: u8) -> LedgerResult<()> {
        let mut wtxn = self.env.write_txn()?;
        self.tiers_db.put(&mut wtxn, hash.as_str(), &code)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Number of entries
    pub fn len(&self) -> LedgerResult<u64> {
        let rtxn = self.env.read_txn()?;
        Ok(self.tiers_db.len(&rtxn)?)
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Count entries per tier.
    pub fn counts(&self) -> LedgerResult<TierCounts> {
        let rtxn = self.env.read_txn()?;
        let mut counts = TierCounts::default();
        for item in self.tiers_db.iter(&rtxn)? {
            let (_, code) = item?;
            counts.add(code);
        }
        Ok(counts)
    }

    /// Sync/flush LMDB to disk
    pub fn sync(&self) -> LedgerResult<()> {
        self.env.force_sync()?;
        Ok(())
    }
}

impl LocationLedger for LmdbLedger {
    fn lookup(&self, hash: &ContentHash) -> LedgerResult<Lookup> {
        let rtxn = self.env.read_txn()?;
        let code = self.tiers_db.get(&rtxn, hash.as_str())?;
        Ok(Lookup::from_code(code))
    }

    fn record(&self, hash: &ContentHash, tier: Tier) -> LedgerResult<()> {
        self.record_raw(hash, tier.code())?;
        debug!(hash = %hash, tier = %tier, "ledger entry recorded");
        Ok(())
    }

    fn forget(&self, hash: &ContentHash) -> LedgerResult<bool> {
        let mut wtxn = self.env.write_txn()?;
        let existed = self.tiers_db.delete(&mut wtxn, hash.as_str())?;
        wtxn.commit()?;
        Ok(existed)
    }
}
