//! # strata CLI
//!
//! Operator tooling for Strata tiered content storage: store blobs, inspect
//! where they resolve, check readability and move single hashes between tiers.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use strata_cas::CasStats;
use strata_config::logging::{init_logging, LogLevel};
use strata_config::{log_cli_info, Config, PROJECT_CONFIG_PATH};
use strata_ledger::{LocationLedger, Lookup, Tier, TierCounts};
use strata_tier::{ContentHash, FileStorage, StoredFile};

mod check;
mod migrate;
mod store;

use store::Store;

/// Strata - tiered content-addressable file storage
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Local store root (overrides config)
    #[arg(long, global = true)]
    local_root: Option<PathBuf>,

    /// Remote mirror root (overrides config)
    #[arg(long, global = true)]
    remote_root: Option<PathBuf>,

    /// Ledger directory (overrides config)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file in the local tier and print its hash
    Put {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the path a read of HASH would use
    Resolve {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
    },

    /// Check that content is readable from some tier
    Check(check::CheckArgs),

    /// Write the content of HASH to stdout
    Cat {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
    },

    /// Inspect or edit ledger entries
    Tier {
        #[command(subcommand)]
        command: TierCommands,
    },

    /// Copy the local copy to the remote tier (marks DUPLICATED)
    Push {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
    },

    /// Copy the remote copy to the local tier (marks DUPLICATED)
    Pull {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
    },

    /// Delete the local copy of a DUPLICATED hash (marks EXTERNAL)
    Evict {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
    },

    /// Local store and ledger statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum TierCommands {
    /// Print the recorded and effective tier
    Get {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
    },
    /// Record a tier without moving any bytes
    Set {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
        #[arg(value_name = "TIER")]
        tier: Tier,
    },
    /// Drop the ledger entry, returning the hash to the absent tier
    Forget {
        #[arg(value_name = "HASH")]
        hash: ContentHash,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file locations
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogLevel::from_verbosity(cli.verbose));

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(root) = cli.local_root {
        config.storage.local_root = root;
    }
    if let Some(root) = cli.remote_root {
        config.remote.root = root;
    }
    if let Some(path) = cli.ledger {
        config.ledger.path = path;
    }

    // Stores are opened per command so `config` never creates directories
    let store = || Store::open(&config);
    match cli.command {
        Commands::Put { file } => cmd_put(&store()?, &file),
        Commands::Resolve { hash } => {
            let store = store()?;
            let tier = store.storage.resolver().effective_tier(&hash);
            println!("{}\t{}", tier, store.storage.resolve_path(&hash));
            Ok(())
        }
        Commands::Check(args) => check::run(&store()?, args),
        Commands::Cat { hash } => cmd_cat(&store()?, &hash),
        Commands::Tier { command } => cmd_tier(&store()?, command),
        Commands::Push { hash } => migrate::push(&store()?, &hash),
        Commands::Pull { hash } => migrate::pull(&store()?, &hash),
        Commands::Evict { hash } => migrate::evict(&store()?, &hash),
        Commands::Stats { json } => cmd_stats(&store()?, json),
        Commands::Config { command } => {
            cmd_config(&config, command.unwrap_or(ConfigCommands::Show))
        }
    }
}

fn cmd_put(store: &Store, file: &std::path::Path) -> Result<()> {
    let hash = store
        .local
        .store_file(file)
        .with_context(|| format!("Failed to store {}", file.display()))?;
    log_cli_info!("Stored", hash = hash.as_str(), file = &*file.to_string_lossy());
    println!("{hash}");
    Ok(())
}

fn cmd_cat(store: &Store, hash: &ContentHash) -> Result<()> {
    let file = StoredFile::new(hash.clone(), 0);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    store
        .storage
        .send_file(&file, &mut out)
        .with_context(|| format!("Failed to read {hash}"))?;
    out.flush()?;
    Ok(())
}

fn cmd_tier(store: &Store, command: TierCommands) -> Result<()> {
    match command {
        TierCommands::Get { hash } => {
            let recorded = match store.ledger.lookup(&hash)? {
                Lookup::Absent => "absent".to_string(),
                Lookup::Tier(tier) => tier.to_string(),
                Lookup::Unknown(code) => format!("unknown({code})"),
            };
            let effective = store.storage.resolver().effective_tier(&hash);
            println!("recorded:  {recorded}");
            println!("effective: {effective}");
        }
        TierCommands::Set { hash, tier } => {
            store.ledger.record(&hash, tier)?;
            log_cli_info!("Tier recorded", hash = hash.as_str(), tier = tier.as_str());
            println!("{hash} -> {tier}");
        }
        TierCommands::Forget { hash } => {
            if store.ledger.forget(&hash)? {
                println!("forgot {hash}");
            } else {
                println!("{hash} had no entry");
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StatsReport {
    local: CasStats,
    ledger: TierCounts,
}

fn cmd_stats(store: &Store, json: bool) -> Result<()> {
    let report = StatsReport {
        local: store.local.stats()?,
        ledger: store.ledger.counts()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Local store: {}", store.local.root().display());
    println!("  blobs:      {}", report.local.blob_count);
    println!("  bytes:      {}", report.local.total_bytes);
    println!("  avg size:   {}", report.local.avg_blob_size());
    println!("Ledger:");
    println!("  local:      {}", report.ledger.local);
    println!("  external:   {}", report.ledger.external);
    println!("  duplicated: {}", report.ledger.duplicated);
    if report.ledger.unknown > 0 {
        println!("  unknown:    {}", report.ledger.unknown);
    }
    Ok(())
}

fn cmd_config(config: &Config, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => print!("{}", config.to_toml()?),
        ConfigCommands::Path => {
            match Config::global_config_path() {
                Some(path) => println!("Global:  {}", path.display()),
                None => println!("Global:  (no home directory)"),
            }
            println!("Project: {PROJECT_CONFIG_PATH}");
        }
    }
    Ok(())
}
