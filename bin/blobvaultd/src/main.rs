//! BlobVault daemon
//!
//! Wires the lifecycle engine, the deletion consumer and the cache-aside
//! decorator onto the reference adapters (disk store, in-process queue and
//! cache) and runs until interrupted.

use anyhow::{Context, Result};
use blobvault_cache::{Cache, MemoryCache};
use blobvault_common::config::Config;
use blobvault_engine::{CachedHosting, FileHosting, HostingEngine, Reaper};
use blobvault_queue::{MemoryQueue, Queue};
use blobvault_store::{ByteStore, DiskStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "blobvaultd")]
#[command(about = "BlobVault file hosting daemon")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/blobvault/blobvault.toml")]
    config: PathBuf,

    /// Data directory (overrides the configured one)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (overrides the configured one)
    #[arg(long)]
    log_level: Option<String>,
}

/// Filter directive to use when `RUST_LOG` is unset: the CLI flag when
/// given, else the configured level
fn log_directive(cli_level: Option<&str>, config_level: &str) -> String {
    cli_level.unwrap_or(config_level).to_string()
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        let raw = std::fs::read_to_string(&args.config)
            .with_context(|| format!("fail read config file {}", args.config.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("fail parse config file {}", args.config.display()))?
    } else {
        Config::default()
    };
    if let Some(data_dir) = &args.data_dir {
        config.store.data_dir.clone_from(data_dir);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                log_directive(args.log_level.as_deref(), &config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting BlobVault daemon");
    info!(data_dir = %config.store.data_dir.display(), "opening byte store");

    let store: Arc<dyn ByteStore> = Arc::new(DiskStore::open(&config.store.data_dir).await?);
    let queue: Arc<dyn Queue> = Arc::new(MemoryQueue::new());
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

    let engine = HostingEngine::new(Arc::clone(&store), Arc::clone(&queue), &config.engine).await?;
    let hosting = CachedHosting::new(engine, cache, &config.cache);
    let reaper = Reaper::new(
        Arc::clone(&store),
        Arc::clone(&queue),
        &config.engine.deletion_queue,
    );

    // The transport layer mounts on top of `hosting`; until a route layer
    // is wired in, the daemon runs the deletion pipeline and reports the
    // store contents at startup.
    // A crash can leave content without its sidecar; that only degrades
    // the listing, so it must not keep the daemon from starting.
    match hosting.get_files().await {
        Ok(files) => info!(count = files.len(), "byte store inventory loaded"),
        Err(err) => tracing::warn!(error = %err, "fail list byte store inventory"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = tokio::spawn(async move { reaper.run(shutdown_rx).await });

    tokio::signal::ctrl_c()
        .await
        .context("fail install interrupt handler")?;
    info!("Shutting down...");
    shutdown_tx.send(true).ok();
    consumer.await.context("deletion consumer panicked")?;

    info!("BlobVault daemon shut down gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_log_level_beats_config() {
        assert_eq!(log_directive(Some("debug"), "warn"), "debug");
        // An explicit flag wins even when it matches a common default
        assert_eq!(log_directive(Some("info"), "warn"), "info");
    }

    #[test]
    fn test_config_log_level_used_when_flag_absent() {
        assert_eq!(log_directive(None, "warn"), "warn");
    }
}
