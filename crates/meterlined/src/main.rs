//! meterlined: the metrics pipeline daemon.
//!
//! Single binary that assembles the pipeline:
//! - Snapshot store (Redis, or in-memory when no URL is given)
//! - Collector
//! - Periodic flusher
//! - HTTP API (exposition, dumps, simulated shop traffic)
//!
//! # Usage
//!
//! ```text
//! meterlined --port 8080 --redis-url redis://127.0.0.1:6379 --flush-interval 5
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use meterline_api::{ApiState, build_router};
use meterline_collect::{Collector, Flusher};
use meterline_store::{MemorySnapshotStore, RedisSnapshotStore, SnapshotStore};

#[derive(Parser)]
#[command(name = "meterlined", about = "Metrics aggregation and snapshot export daemon")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Snapshot store URL (redis://[user:password@]host:port[/db]).
    /// Falls back to an in-memory store when omitted.
    #[arg(long)]
    redis_url: Option<String>,

    /// Flush period in seconds.
    #[arg(long, default_value = "5")]
    flush_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meterlined=debug,meterline=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    info!("meterline daemon starting");

    // ── Snapshot store ─────────────────────────────────────────

    let store: Arc<dyn SnapshotStore> = match &cli.redis_url {
        Some(url) => Arc::new(RedisSnapshotStore::connect(url).await?),
        None => {
            warn!("no --redis-url given; snapshots will be held in memory only");
            Arc::new(MemorySnapshotStore::new())
        }
    };
    info!(backend = store.backend_name(), "snapshot store ready");

    // ── Collector + flusher ────────────────────────────────────

    let collector = Collector::new();
    let flusher = Arc::new(Flusher::new(
        collector.clone(),
        store.clone(),
        Duration::from_secs(cli.flush_interval),
    ));
    info!(interval = cli.flush_interval, "flusher initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let flusher_handle = {
        let flusher = flusher.clone();
        tokio::spawn(async move {
            flusher.run(shutdown_rx).await;
        })
    };

    // ── HTTP API ───────────────────────────────────────────────

    let router = build_router(ApiState::new(collector, store));
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C; the flusher gets one final flush.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for the final flush to complete.
    let _ = flusher_handle.await;

    info!("meterline daemon stopped");
    Ok(())
}
