//! meterline-core: shared vocabulary of the metrics pipeline.
//!
//! Defines the three metric kinds, the canonical string key under which a
//! metric's snapshot is stored, and the JSON record shape written to the
//! snapshot store. Everything here is plain data; the collection, flushing,
//! and rendering machinery lives in the sibling crates.
//!
//! # Key schema
//!
//! Snapshot keys follow `metrics:<kind>:<name>[:<k1>=<v1>,<k2>=<v2>,...]`.
//! Label pairs are serialized in the order the caller supplied them, so two
//! label sets with the same pairs in different order produce distinct keys.
//! Callers are expected to supply labels in a fixed order per series.

pub mod error;
pub mod key;
pub mod record;

pub use error::{CodecError, CodecResult};
pub use key::{KEY_PREFIX, MetricKey, MetricKind, SCAN_PATTERN};
pub use record::SnapshotRecord;
