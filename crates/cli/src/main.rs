//! # keycache
//!
//! Resolve configuration keys through the cache-first resolution chain:
//! fresh cache, remote store, stale cache, then the static fallback.

mod bootstrap;
mod di;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use keycache_domain::CliOverrides;
use keycache_infrastructure::keys::{InitPhase, KeyService};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "keycache")]
#[command(version)]
#[command(about = "Cache-first key resolution over a remote document store")]
struct Cli {
    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<String>,

    /// JSON document collection to use as the remote store
    #[arg(short = 'd', long, global = true)]
    documents: Option<String>,

    /// Lifetime of cached entries, in seconds
    #[arg(long, global = true)]
    ttl: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a key from the remote chain only (no static fallback)
    Resolve {
        key: String,

        /// Answer from what the bulk load cached; no point fetch
        #[arg(long)]
        cached: bool,
    },

    /// Resolve a key, falling back to static values
    Get {
        key: String,

        #[arg(long)]
        cached: bool,

        /// Disable the static fallback for this call
        #[arg(long)]
        no_static: bool,
    },

    /// Keep the subscription open and report cache stats until Ctrl+C
    Watch {
        /// Seconds between stats reports
        #[arg(short = 'i', long, default_value = "10")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        documents_path: cli.documents.clone(),
        default_ttl_secs: cli.ttl,
        static_fallback: None,
        log_level: cli.log_level.clone(),
    };
    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    let service = di::build_service(&config);

    let result = match cli.command {
        Command::Resolve { key, cached } => resolve(&service, &key, cached).await,
        Command::Get {
            key,
            cached,
            no_static,
        } => get(&service, &key, cached, no_static).await,
        Command::Watch { interval } => watch(&service, Duration::from_secs(interval.max(1))).await,
    };

    service.teardown().await;
    result
}

async fn resolve(service: &KeyService, key: &str, cached: bool) -> anyhow::Result<()> {
    if cached {
        warm(service).await;
        let value = service
            .resolve_cached(key)
            .ok_or_else(|| anyhow!("{key} is not cached"))?;
        println!("{value}");
        return Ok(());
    }

    let resolution = service
        .resolve(key)
        .await
        .with_context(|| format!("failed to resolve {key}"))?;
    if resolution.is_stale() {
        warn!(key = %key, "Remote store unavailable, value may be out of date");
    }
    info!(key = %key, origin = %resolution.origin, "Key resolved");
    println!("{}", resolution.value);
    Ok(())
}

async fn get(service: &KeyService, key: &str, cached: bool, no_static: bool) -> anyhow::Result<()> {
    if no_static {
        service.disable_static_fallback();
    }

    let value = if cached {
        warm(service).await;
        service.get_cached(key)
    } else {
        service.get(key).await
    };
    let value = value.ok_or_else(|| anyhow!("no value for {key}"))?;
    println!("{value}");
    Ok(())
}

/// Load the cache so cache-only reads have something to answer from.
async fn warm(service: &KeyService) {
    if service.start().await.is_err() {
        warn!("Cache not loaded, cache-only read may come back empty");
    }
}

/// Retry the bulk load and subscription if they have not completed yet.
/// Returns whether the service is initialized afterwards.
async fn retry_pending_start(service: &KeyService) -> bool {
    if service.initializer().phase() == InitPhase::Completed {
        return true;
    }
    match service.start().await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Initialization retry failed");
            false
        }
    }
}

async fn watch(service: &KeyService, interval: Duration) -> anyhow::Result<()> {
    if service.start().await.is_err() {
        warn!("Watching without initial load, will retry on next report");
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                info!("Shutdown requested");
                return Ok(());
            }
            _ = ticker.tick() => {
                retry_pending_start(service).await;
                let stats = service.stats().await;
                info!(
                    entries = stats.entries,
                    stale_entries = stats.stale_entries,
                    hits = stats.hits,
                    misses = stats.misses,
                    stale_served = stats.stale_served,
                    hit_rate = stats.hit_rate,
                    init_phase = stats.init_phase.as_str(),
                    subscription_active = stats.subscription_active,
                    "Cache stats"
                );
            }
        }
    }
}
