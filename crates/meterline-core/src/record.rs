//! Persisted snapshot record shapes.
//!
//! One record is written per metric key per flush cycle. The `type` field
//! discriminates the JSON shape on the wire, so a record can be decoded
//! without consulting its key.

use serde::{Deserialize, Serialize};

use crate::key::MetricKind;

/// The reduced, timestamped value stored for one metric key.
///
/// Timestamps are unix milliseconds taken at flush time. Counter values are
/// per-interval deltas; gauge values are levels; histogram fields are the
/// summary statistics of the samples recorded during the interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SnapshotRecord {
    Counter {
        value: f64,
        timestamp: u64,
    },
    Gauge {
        value: f64,
        timestamp: u64,
    },
    Histogram {
        count: u64,
        sum: f64,
        min: f64,
        max: f64,
        avg: f64,
        p50: f64,
        p95: f64,
        p99: f64,
        timestamp: u64,
    },
}

impl SnapshotRecord {
    pub fn kind(&self) -> MetricKind {
        match self {
            SnapshotRecord::Counter { .. } => MetricKind::Counter,
            SnapshotRecord::Gauge { .. } => MetricKind::Gauge,
            SnapshotRecord::Histogram { .. } => MetricKind::Histogram,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            SnapshotRecord::Counter { timestamp, .. }
            | SnapshotRecord::Gauge { timestamp, .. }
            | SnapshotRecord::Histogram { timestamp, .. } => *timestamp,
        }
    }
}
