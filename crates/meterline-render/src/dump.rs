//! JSON dump of stored snapshots, for debugging and ad-hoc inspection.

use serde_json::{Map, Value};
use tracing::warn;

use meterline_core::SCAN_PATTERN;
use meterline_store::{SnapshotStore, StoreResult};

/// Scan every snapshot key and decode its record into a JSON map keyed by
/// the storage key.
///
/// A value that is not valid JSON is included as a raw string rather than
/// dropped, so a partially corrupted store is still inspectable.
pub async fn snapshot_dump(store: &dyn SnapshotStore) -> StoreResult<Map<String, Value>> {
    let mut keys = store.scan_keys(SCAN_PATTERN).await?;
    keys.sort();

    let mut out = Map::new();
    for key in keys {
        let Some(raw) = store.get(&key).await? else {
            continue;
        };
        match serde_json::from_slice::<Value>(&raw) {
            Ok(value) => {
                out.insert(key, value);
            }
            Err(e) => {
                warn!(%key, error = %e, "snapshot value is not valid json");
                out.insert(key, Value::String(String::from_utf8_lossy(&raw).into_owned()));
            }
        }
    }
    Ok(out)
}
