//! `strata check`: readability report for a batch of hashes.

use anyhow::{bail, Result};
use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use strata_config::log_cli_debug;
use strata_tier::{ContentHash, StoredFile};

use crate::store::Store;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Content hashes to check
    #[arg(value_name = "HASH", required = true)]
    hashes: Vec<ContentHash>,

    /// Only test presence in either tier; no recovery, no sync
    #[arg(long)]
    by_hash: bool,

    /// Emit one JSON document instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct CheckRow {
    hash: String,
    tier: &'static str,
    path: String,
    readable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recovery: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<bool>,
}

fn check_one(store: &Store, hash: &ContentHash, by_hash: bool) -> CheckRow {
    let tier = store.storage.resolver().effective_tier(hash).as_str();
    let path = store.storage.resolve_path(hash).to_string();

    if by_hash {
        return CheckRow {
            hash: hash.to_string(),
            tier,
            path,
            readable: store.storage.is_readable_by_hash(hash),
            local: None,
            recovery: None,
            remote: None,
        };
    }

    // Size is only a buffer hint on this path
    let report = store
        .storage
        .check_readable(&StoredFile::new(hash.clone(), 0));
    CheckRow {
        hash: hash.to_string(),
        tier,
        path,
        readable: report.is_readable(),
        local: Some(report.local.readable),
        recovery: Some(report.local.recovery.as_str()),
        remote: report.remote,
    }
}

pub fn run(store: &Store, args: CheckArgs) -> Result<()> {
    log_cli_debug!("Checking hashes", count = args.hashes.len());

    let rows: Vec<CheckRow> = args
        .hashes
        .par_iter()
        .map(|hash| check_one(store, hash, args.by_hash))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            let verdict = if row.readable { "ok" } else { "UNREADABLE" };
            match row.recovery {
                Some(recovery) => println!(
                    "{:<10} {:<10} {} (recovery: {})",
                    verdict, row.tier, row.hash, recovery
                ),
                None => println!("{:<10} {:<10} {}", verdict, row.tier, row.hash),
            }
        }
    }

    let unreadable = rows.iter().filter(|r| !r.readable).count();
    if unreadable > 0 {
        bail!("{} of {} hashes unreadable", unreadable, rows.len());
    }
    Ok(())
}
