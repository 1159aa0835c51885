//! meterline-collect: in-memory accumulation and periodic export.
//!
//! Instrumentation calls land in the [`Collector`]; the [`Flusher`] drains
//! it on a fixed period, reduces histogram buffers to summary statistics,
//! and writes one snapshot record per metric key to the snapshot store with
//! an expiry.
//!
//! # Architecture
//!
//! ```text
//! Collector
//!   ├── increment_counter() / set_gauge() / record_histogram()
//!   └── drain() → point-in-time coherent copy, counters/histograms cleared
//!
//! Flusher
//!   ├── flush_once() → drain, reduce, batch-write with TTL
//!   └── run() → periodic loop with final flush on shutdown
//! ```

pub mod collector;
pub mod flusher;
pub mod reduce;

pub use collector::{Collector, Drained, HISTOGRAM_CAPACITY};
pub use flusher::{DEFAULT_FLUSH_INTERVAL, Flusher, SNAPSHOT_TTL};
pub use reduce::{HistogramSummary, reduce};
