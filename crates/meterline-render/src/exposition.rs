//! Prometheus text exposition format.
//!
//! Scans every snapshot key, decodes the stored records, and emits
//! HELP/TYPE comment lines plus sample lines. Sample timestamps come from
//! the stored records, so rendering an unchanged store twice produces
//! byte-identical output.
//!
//! Histograms are exposed as `_count` and `_sum` lines only; the stored
//! percentiles are not rendered as `_bucket` or quantile lines.

use tracing::{debug, warn};

use meterline_core::{MetricKey, MetricKind, SCAN_PATTERN, SnapshotRecord};
use meterline_store::{SnapshotStore, StoreResult};

/// Content type of the exposition output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Render every stored snapshot into Prometheus text format.
///
/// Keys that fail to parse and records that fail to decode are skipped
/// individually; only store I/O errors abort the render.
pub async fn render(store: &dyn SnapshotStore) -> StoreResult<String> {
    let mut keys = store.scan_keys(SCAN_PATTERN).await?;
    // Scan order is backend-dependent; sort for deterministic output.
    keys.sort();

    let mut out = String::new();
    for key in keys {
        let parsed = match MetricKey::parse(&key) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(%key, error = %e, "skipping unparseable snapshot key");
                continue;
            }
        };

        // The key may have expired between scan and get.
        let Some(raw) = store.get(&key).await? else {
            continue;
        };

        let record: SnapshotRecord = match serde_json::from_slice(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(%key, error = %e, "skipping malformed snapshot record");
                continue;
            }
        };

        append_metric(&mut out, &parsed, &record);
    }

    Ok(out)
}

fn append_metric(out: &mut String, key: &MetricKey, record: &SnapshotRecord) {
    let name = &key.name;
    let labels = format_labels(&key.labels);

    match (key.kind, record) {
        (MetricKind::Counter, SnapshotRecord::Counter { value, timestamp }) => {
            out.push_str(&format!("# HELP {name} {name} total\n"));
            out.push_str(&format!("# TYPE {name} counter\n"));
            out.push_str(&format!("{name}{labels} {value} {timestamp}\n"));
        }
        (MetricKind::Gauge, SnapshotRecord::Gauge { value, timestamp }) => {
            out.push_str(&format!("# HELP {name} {name} gauge\n"));
            out.push_str(&format!("# TYPE {name} gauge\n"));
            out.push_str(&format!("{name}{labels} {value} {timestamp}\n"));
        }
        (
            MetricKind::Histogram,
            SnapshotRecord::Histogram {
                count,
                sum,
                timestamp,
                ..
            },
        ) => {
            out.push_str(&format!("# HELP {name} {name} histogram\n"));
            out.push_str(&format!("# TYPE {name} histogram\n"));
            out.push_str(&format!("{name}_count{labels} {count} {timestamp}\n"));
            out.push_str(&format!("{name}_sum{labels} {sum} {timestamp}\n"));
        }
        (kind, record) => {
            warn!(
                name = %name,
                key_kind = %kind,
                record_kind = %record.kind(),
                "skipping record whose kind disagrees with its key"
            );
        }
    }
}

fn format_labels(labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect();
    format!("{{{}}}", pairs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use meterline_store::{MemorySnapshotStore, SnapshotEntry};

    const TTL: Duration = Duration::from_secs(60);

    async fn put_record(store: &MemorySnapshotStore, key: &str, record: &SnapshotRecord) {
        let entry = SnapshotEntry::new(key.to_string(), serde_json::to_vec(record).unwrap());
        store.batch_set(vec![entry], TTL).await.unwrap();
    }

    async fn put_raw(store: &MemorySnapshotStore, key: &str, raw: &str) {
        let entry = SnapshotEntry::new(key.to_string(), raw.as_bytes().to_vec());
        store.batch_set(vec![entry], TTL).await.unwrap();
    }

    #[tokio::test]
    async fn renders_counter_with_labels() {
        let store = MemorySnapshotStore::new();
        put_record(
            &store,
            "metrics:counter:user_events:event=joined",
            &SnapshotRecord::Counter {
                value: 4.0,
                timestamp: 1000,
            },
        )
        .await;

        let out = render(&store).await.unwrap();
        assert_eq!(
            out,
            "# HELP user_events user_events total\n\
             # TYPE user_events counter\n\
             user_events{event=\"joined\"} 4 1000\n"
        );
    }

    #[tokio::test]
    async fn renders_gauge_without_labels_omits_braces() {
        let store = MemorySnapshotStore::new();
        put_record(
            &store,
            "metrics:gauge:queue_depth",
            &SnapshotRecord::Gauge {
                value: 7.5,
                timestamp: 2000,
            },
        )
        .await;

        let out = render(&store).await.unwrap();
        assert!(out.contains("# TYPE queue_depth gauge\n"));
        assert!(out.contains("queue_depth 7.5 2000\n"));
        assert!(!out.contains("queue_depth{"));
    }

    #[tokio::test]
    async fn renders_histogram_count_and_sum_only() {
        let store = MemorySnapshotStore::new();
        put_record(
            &store,
            "metrics:histogram:latency_ms:endpoint=join",
            &SnapshotRecord::Histogram {
                count: 5,
                sum: 15.0,
                min: 1.0,
                max: 5.0,
                avg: 3.0,
                p50: 3.0,
                p95: 5.0,
                p99: 5.0,
                timestamp: 3000,
            },
        )
        .await;

        let out = render(&store).await.unwrap();
        assert!(out.contains("# TYPE latency_ms histogram\n"));
        assert!(out.contains("latency_ms_count{endpoint=\"join\"} 5 3000\n"));
        assert!(out.contains("latency_ms_sum{endpoint=\"join\"} 15 3000\n"));
        // Percentiles are stored but never exposed.
        assert!(!out.contains("p50"));
        assert!(!out.contains("_bucket"));
    }

    #[tokio::test]
    async fn render_is_idempotent_over_unchanged_store() {
        let store = MemorySnapshotStore::new();
        put_record(
            &store,
            "metrics:counter:a",
            &SnapshotRecord::Counter {
                value: 1.0,
                timestamp: 10,
            },
        )
        .await;
        put_record(
            &store,
            "metrics:gauge:b",
            &SnapshotRecord::Gauge {
                value: 2.0,
                timestamp: 20,
            },
        )
        .await;

        let first = render(&store).await.unwrap();
        let second = render(&store).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_record_is_skipped_others_render() {
        let store = MemorySnapshotStore::new();
        put_raw(&store, "metrics:counter:broken", "not json").await;
        put_record(
            &store,
            "metrics:counter:fine",
            &SnapshotRecord::Counter {
                value: 1.0,
                timestamp: 10,
            },
        )
        .await;

        let out = render(&store).await.unwrap();
        assert!(!out.contains("broken"));
        assert!(out.contains("fine 1 10\n"));
    }

    #[tokio::test]
    async fn unparseable_key_is_skipped() {
        let store = MemorySnapshotStore::new();
        put_raw(
            &store,
            "metrics:timer:unknown_kind",
            r#"{"type":"counter","value":1.0,"timestamp":1}"#,
        )
        .await;

        let out = render(&store).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn kind_mismatch_between_key_and_record_is_skipped() {
        let store = MemorySnapshotStore::new();
        put_raw(
            &store,
            "metrics:counter:confused",
            r#"{"type":"gauge","value":1.0,"timestamp":1}"#,
        )
        .await;

        let out = render(&store).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn same_name_different_label_sets_each_get_help_and_type() {
        let store = MemorySnapshotStore::new();
        for (key, value) in [
            ("metrics:counter:user_events:event=joined", 4.0),
            ("metrics:counter:user_events:event=left", 2.0),
        ] {
            put_record(
                &store,
                key,
                &SnapshotRecord::Counter {
                    value,
                    timestamp: 100,
                },
            )
            .await;
        }

        let out = render(&store).await.unwrap();
        // Duplicate HELP/TYPE lines are emitted, not deduplicated.
        assert_eq!(out.matches("# TYPE user_events counter\n").count(), 2);
        assert!(out.contains("user_events{event=\"joined\"} 4 100\n"));
        assert!(out.contains("user_events{event=\"left\"} 2 100\n"));
    }

    #[tokio::test]
    async fn empty_store_renders_empty_output() {
        let store = MemorySnapshotStore::new();
        assert_eq!(render(&store).await.unwrap(), "");
    }

    #[test]
    fn format_labels_pairs() {
        assert_eq!(format_labels(&[]), "");
        let labels = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        assert_eq!(format_labels(&labels), "{a=\"1\",b=\"2\"}");
    }
}
