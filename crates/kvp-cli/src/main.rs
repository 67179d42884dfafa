use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use kvp_config::{HumanDuration, PrefetchConfig};
use kvp_core::Snapshot;
use kvp_runtime::tracing_init::init_tracing;
use kvp_runtime::{JsonLinesSource, PrefetchingSupplier, SupplierStatus, UpdateSource};

#[derive(Parser)]
#[command(name = "kv-prefetch", about = "Prefetching key-value view")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines update file and print the final snapshot
    Replay {
        /// Update file, one `{"op":"put"|"drop",...}` object per line
        #[arg(short, long)]
        updates: PathBuf,
        /// Path to a kvp.toml config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON object used as the initial snapshot
        #[arg(long)]
        initial: Option<PathBuf>,
        /// Override [batching] max_batch_size
        #[arg(long)]
        max_batch_size: Option<usize>,
        /// Override [batching] max_latency (e.g. "250ms", "1s")
        #[arg(long)]
        max_latency: Option<String>,
    },
    /// Validate a config file and print the effective batching settings
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            updates,
            config,
            initial,
            max_batch_size,
            max_latency,
        } => {
            let (mut prefetch_config, base_dir) = load_config(config.as_deref())?;
            if let Some(size) = max_batch_size {
                prefetch_config.batching.max_batch_size = size;
            }
            if let Some(latency) = max_latency {
                prefetch_config.batching.max_latency = HumanDuration::from_str(&latency)
                    .map_err(|e| anyhow::anyhow!("invalid --max-latency '{latency}': {e}"))?;
            }
            prefetch_config.batching.validate()?;

            let _guard = init_tracing(&prefetch_config.logging, &base_dir)?;
            replay(&prefetch_config, &updates, initial.as_deref()).await
        }
        Commands::Check { config } => {
            let (prefetch_config, _) = load_config(Some(&config))?;
            println!("max_batch_size   = {}", prefetch_config.batching.max_batch_size);
            println!("max_latency      = {}", prefetch_config.batching.max_latency);
            println!("channel_capacity = {}", prefetch_config.source.channel_capacity);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load `path`, or the defaults when no config is given. Relative paths in
/// the config resolve against the returned base directory.
fn load_config(path: Option<&Path>) -> Result<(PrefetchConfig, PathBuf)> {
    match path {
        Some(path) => {
            let config_path = path
                .canonicalize()
                .map_err(|e| anyhow::anyhow!("config path '{}': {e}", path.display()))?;
            let config = PrefetchConfig::load(&config_path)?;
            let base_dir = config_path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| anyhow::anyhow!("config path has no parent directory"))?;
            Ok((config, base_dir))
        }
        None => Ok((PrefetchConfig::default(), std::env::current_dir()?)),
    }
}

fn read_initial(path: &Path) -> Result<Snapshot<String, Value>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("initial snapshot '{}': {e}", path.display()))?;
    let entries: HashMap<String, Value> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("initial snapshot '{}': {e}", path.display()))?;
    Ok(Snapshot::from(entries))
}

async fn replay(config: &PrefetchConfig, updates: &Path, initial: Option<&Path>) -> Result<ExitCode> {
    let initial = match initial {
        Some(path) => read_initial(path)?,
        None => Snapshot::empty(),
    };
    let file = tokio::fs::File::open(updates)
        .await
        .map_err(|e| anyhow::anyhow!("updates file '{}': {e}", updates.display()))?;

    // File decoding runs in its own task; the bounded channel applies
    // backpressure to it when the supplier falls behind.
    let mut source = JsonLinesSource::<_, String, Value>::new(BufReader::new(file));
    let (tx, rx) = mpsc::channel(config.source.channel_capacity);
    let feeder = tokio::spawn(async move {
        while let Some(item) = source.next_update().await {
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                break;
            }
        }
        source.lines_read()
    });

    let supplier = PrefetchingSupplier::with_initial_value(initial, rx, config.batching)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let status = tokio::select! {
        status = supplier.wait_stopped() => status,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(domain = "sys", "interrupted, closing supplier");
            SupplierStatus::Cancelled
        }
    };

    let snapshot = supplier.get();
    let metrics = supplier.metrics();
    let last_successful_update = supplier.last_successful_update();
    supplier.close().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let lines = feeder.await?;

    let sorted: BTreeMap<&String, &Value> = snapshot.iter().collect();
    println!("{}", serde_json::to_string_pretty(&sorted)?);

    tracing::info!(
        domain = "res",
        lines,
        entries = snapshot.len(),
        received = metrics.updates_received,
        applied = metrics.updates_applied,
        discarded = metrics.updates_discarded,
        by_size = metrics.batches_by_size,
        by_latency = metrics.batches_by_latency,
        by_drain = metrics.batches_by_drain,
        %last_successful_update,
        "replay finished"
    );

    match status {
        SupplierStatus::Failed(reason) => {
            tracing::error!(domain = "pipe", %reason, "replay stopped on a bad update");
            Ok(ExitCode::FAILURE)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}
