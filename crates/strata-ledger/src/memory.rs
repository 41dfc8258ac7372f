//! In-memory ledger.

use dashmap::DashMap;

use crate::{ContentHash, LedgerResult, LocationLedger, Lookup, Tier, TierCounts};

/// Concurrent in-process ledger. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: DashMap<ContentHash, u8>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw code, including ones [`Tier`] does not recognize.
    pub fn record_raw(&self, hash: &ContentHash, code: u8) {
        self.entries.insert(hash.clone(), code);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for entry in self.entries.iter() {
            counts.add(*entry.value());
        }
        counts
    }
}

impl LocationLedger for MemoryLedger {
    fn lookup(&self, hash: &ContentHash) -> LedgerResult<Lookup> {
        Ok(Lookup::from_code(self.entries.get(hash).map(|c| *c.value())))
    }

    fn record(&self, hash: &ContentHash, tier: Tier) -> LedgerResult<()> {
        self.entries.insert(hash.clone(), tier.code());
        Ok(())
    }

    fn forget(&self, hash: &ContentHash) -> LedgerResult<bool> {
        Ok(self.entries.remove(hash).is_some())
    }
}
