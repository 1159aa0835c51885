//! In-memory snapshot store.
//!
//! Backs tests and storeless local runs. Entries carry an expiry instant and
//! are dropped lazily when read back, which is enough fidelity for a store
//! whose only TTL contract is "absent after expiry".

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::backend::{SnapshotEntry, SnapshotStore};
use crate::error::StoreResult;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Snapshot store held entirely in process memory.
#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().expect("snapshot store lock poisoned");
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Match `text` against a glob `pattern` where `*` matches any run of
/// characters. No other metacharacters are supported.
fn glob_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, rest)) => {
            let Some(text) = text.strip_prefix(prefix) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            let mut starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
            starts.push(text.len());
            starts.into_iter().any(|i| glob_match(rest, &text[i..]))
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn batch_set(&self, batch: Vec<SnapshotEntry>, ttl: Duration) -> StoreResult<()> {
        let expires_at = Instant::now() + ttl;
        let mut entries = self.entries.lock().expect("snapshot store lock poisoned");
        for item in batch {
            entries.insert(
                item.key,
                Entry {
                    value: item.value,
                    expires_at,
                },
            );
        }
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("snapshot store lock poisoned");
        entries.retain(|_, e| e.expires_at > now);
        Ok(entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.lock().expect("snapshot store lock poisoned");
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value.clone()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
