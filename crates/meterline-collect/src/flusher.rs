//! Periodic flush of drained metrics to the snapshot store.
//!
//! The flush cycle drains the collector under its lock, reduces and
//! serializes outside the lock, and submits everything as one batched
//! write-with-expiry. Counters and histogram buffers are cleared by the
//! drain before the write is confirmed: if the batch fails, that cycle's
//! deltas are lost. This is the accepted contract here (deltas are never
//! reported twice); the failure is logged and the next cycle proceeds.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, error, info};

use meterline_core::SnapshotRecord;
use meterline_store::{SnapshotEntry, SnapshotStore};

use crate::collector::Collector;
use crate::reduce::reduce;

/// Expiry applied to every snapshot record.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default flush period.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Drains the collector on a fixed period and persists snapshot records.
pub struct Flusher {
    collector: Collector,
    store: Arc<dyn SnapshotStore>,
    interval: Duration,
}

impl Flusher {
    pub fn new(collector: Collector, store: Arc<dyn SnapshotStore>, interval: Duration) -> Self {
        Self {
            collector,
            store,
            interval,
        }
    }

    /// Run one full drain-reduce-persist cycle. Returns the number of
    /// records written.
    pub async fn flush_once(&self) -> anyhow::Result<usize> {
        let drained = self.collector.drain();
        if drained.is_empty() {
            return Ok(0);
        }

        let timestamp = unix_ms();
        let mut entries = Vec::new();

        for (key, value) in drained.counters {
            let record = SnapshotRecord::Counter { value, timestamp };
            entries.push(SnapshotEntry::new(key, serde_json::to_vec(&record)?));
        }

        for (key, value) in drained.gauges {
            let record = SnapshotRecord::Gauge { value, timestamp };
            entries.push(SnapshotEntry::new(key, serde_json::to_vec(&record)?));
        }

        for (key, samples) in drained.histograms {
            // A histogram with no samples this interval is skipped entirely.
            let Some(summary) = reduce(&samples) else {
                continue;
            };
            let record = SnapshotRecord::Histogram {
                count: summary.count,
                sum: summary.sum,
                min: summary.min,
                max: summary.max,
                avg: summary.avg,
                p50: summary.p50,
                p95: summary.p95,
                p99: summary.p99,
                timestamp,
            };
            entries.push(SnapshotEntry::new(key, serde_json::to_vec(&record)?));
        }

        if entries.is_empty() {
            return Ok(0);
        }

        let written = entries.len();
        self.store.batch_set(entries, SNAPSHOT_TTL).await?;
        debug!(records = written, "snapshot batch written");
        Ok(written)
    }

    /// Run the flush loop until the shutdown signal fires, then attempt one
    /// best-effort final flush.
    ///
    /// The loop awaits each flush before re-arming the timer, so cycles
    /// never overlap.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            backend = self.store.backend_name(),
            "flusher started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.flush_once().await {
                        error!(error = %e, "flush cycle abandoned, drained deltas for this cycle are lost");
                    }
                }
                _ = shutdown.changed() => {
                    info!("flusher shutting down");
                    if let Err(e) = self.flush_once().await {
                        error!(error = %e, "final flush failed");
                    }
                    break;
                }
            }
        }
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
