//! Single-hash migration steps: `push`, `pull` and `evict`.
//!
//! Bytes move first, the ledger entry second. A crash in between leaves an
//! extra copy the ledger does not know about, never an entry pointing at a
//! copy that is not there.

use anyhow::{bail, Context, Result};
use strata_config::log_cli_info;
use strata_ledger::{LocationLedger, Lookup, Tier};
use strata_tier::ContentHash;

use crate::store::Store;

/// Copy the local copy up and mark the hash duplicated.
pub fn push(store: &Store, hash: &ContentHash) -> Result<()> {
    match store.ledger.lookup(hash)? {
        Lookup::Tier(Tier::Duplicated) if store.remote_holds(hash) => {
            println!("{hash} already duplicated");
            return Ok(());
        }
        Lookup::Tier(Tier::External) => {
            bail!("{hash} is external; nothing local to push");
        }
        Lookup::Unknown(code) => {
            bail!("{hash} has unrecognized ledger code {code}; fix it with `strata tier set`");
        }
        _ => {}
    }

    let bytes = store
        .storage
        .try_copy_local_to_remote(hash)
        .with_context(|| format!("Failed to push {hash}"))?;
    store.ledger.record(hash, Tier::Duplicated)?;

    log_cli_info!("Pushed", hash = hash.as_str(), bytes = bytes);
    println!("pushed {hash} ({bytes} bytes)");
    Ok(())
}

/// Copy the remote copy down and mark the hash duplicated.
pub fn pull(store: &Store, hash: &ContentHash) -> Result<()> {
    match store.ledger.lookup(hash)? {
        Lookup::Absent | Lookup::Tier(Tier::Local) => {
            bail!("{hash} was never migrated; the local copy is the only copy");
        }
        Lookup::Tier(Tier::Duplicated) if store.local.is_readable(hash) => {
            println!("{hash} already duplicated");
            return Ok(());
        }
        Lookup::Unknown(code) => {
            bail!("{hash} has unrecognized ledger code {code}; fix it with `strata tier set`");
        }
        _ => {}
    }

    let bytes = store
        .storage
        .try_copy_remote_to_local(hash)
        .with_context(|| format!("Failed to pull {hash}"))?;
    store.ledger.record(hash, Tier::Duplicated)?;

    log_cli_info!("Pulled", hash = hash.as_str(), bytes = bytes);
    println!("pulled {hash} ({bytes} bytes)");
    Ok(())
}

/// Drop the local copy of a duplicated hash and mark it external.
///
/// Refuses unless the ledger says the remote holds a copy and the remote
/// actually serves it.
pub fn evict(store: &Store, hash: &ContentHash) -> Result<()> {
    match store.ledger.lookup(hash)? {
        Lookup::Tier(Tier::Duplicated) => {}
        Lookup::Tier(Tier::External) => {
            println!("{hash} already external");
            return Ok(());
        }
        Lookup::Absent | Lookup::Tier(Tier::Local) => {
            bail!("Refusing to evict {hash}: the local copy is the only copy (run `strata push` first)");
        }
        Lookup::Unknown(code) => {
            bail!("Refusing to evict {hash}: unrecognized ledger code {code}");
        }
    }
    if !store.remote_holds(hash) {
        bail!("Refusing to evict {hash}: the remote copy is not readable");
    }

    // Readers switch to the remote before the local copy disappears
    store.ledger.record(hash, Tier::External)?;
    if store.local.exists(hash) {
        store
            .storage
            .try_delete_local(hash)
            .with_context(|| format!("Failed to delete local copy of {hash}"))?;
    }

    log_cli_info!("Evicted", hash = hash.as_str());
    println!("evicted {hash}");
    Ok(())
}
