//! meterline-render: the read path over stored snapshots.
//!
//! Scans the snapshot store and renders what it finds, either as Prometheus
//! text exposition for scrapers or as a JSON dump for debugging. The read
//! path never touches the collector: everything it reports comes from the
//! store, generated fresh on every call.

pub mod dump;
pub mod exposition;

pub use dump::snapshot_dump;
pub use exposition::{CONTENT_TYPE, render};
