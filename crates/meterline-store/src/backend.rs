//! Snapshot store trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreResult;

/// One key/value pair queued into a batched write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl SnapshotEntry {
    pub fn new(key: String, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

/// Contract the pipeline requires from an external TTL key-value store.
///
/// Implementations must tolerate concurrent callers. A successful
/// `batch_set` means every entry was accepted at least once; a failed one
/// gives no guarantee about partial application.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Write all entries with the given expiry in a single round trip.
    async fn batch_set(&self, entries: Vec<SnapshotEntry>, ttl: Duration) -> StoreResult<()>;

    /// List keys matching a glob pattern (`*` wildcard only).
    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Fetch a single value; `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Validate the backend is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}
