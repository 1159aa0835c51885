//! Canonical snapshot key construction and parsing.
//!
//! A metric series is identified by its kind, name, and label set. The
//! canonical string form doubles as the storage key in the snapshot store,
//! which keeps the read path free of any index lookup: a prefix scan over
//! `metrics:*` recovers every live series.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Prefix shared by every snapshot key.
pub const KEY_PREFIX: &str = "metrics";

/// Scan pattern matching every snapshot key.
pub const SCAN_PATTERN: &str = "metrics:*";

/// The closed set of metric kinds.
///
/// Kind strings on the wire are lower-case (`counter`, `gauge`, `histogram`);
/// anything else fails key parsing rather than silently skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Accumulating metric, reported as a per-interval delta.
    Counter,
    /// Last-write-wins level metric, persists across intervals.
    Gauge,
    /// Distribution of sampled values, reduced to summary statistics.
    Histogram,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            "histogram" => Ok(MetricKind::Histogram),
            other => Err(CodecError::UnknownKind(other.to_string())),
        }
    }
}

/// Identity of one metric series.
///
/// Labels keep insertion order. The order is part of the identity: the same
/// pairs supplied in a different order name a different series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub kind: MetricKind,
    pub name: String,
    pub labels: Vec<(String, String)>,
}

impl MetricKey {
    /// Build a key from a name and borrowed label pairs.
    pub fn new(kind: MetricKind, name: &str, labels: &[(&str, &str)]) -> Self {
        Self {
            kind,
            name: name.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Encode into the canonical storage key.
    pub fn encode(&self) -> String {
        let mut key = format!("{}:{}:{}", KEY_PREFIX, self.kind, self.name);
        if !self.labels.is_empty() {
            let pairs: Vec<String> = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            key.push(':');
            key.push_str(&pairs.join(","));
        }
        key
    }

    /// Parse a storage key back into its parts.
    ///
    /// The key splits into at most four `:`-separated segments; the label
    /// segment (if present) splits on `,` into `k=v` pairs. Pairs without an
    /// `=` are dropped.
    pub fn parse(raw: &str) -> CodecResult<Self> {
        let mut parts = raw.splitn(4, ':');

        match parts.next() {
            Some(KEY_PREFIX) => {}
            _ => return Err(CodecError::MissingPrefix(raw.to_string())),
        }

        let kind: MetricKind = parts
            .next()
            .ok_or_else(|| CodecError::Malformed(raw.to_string()))?
            .parse()?;

        let name = match parts.next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(CodecError::Malformed(raw.to_string())),
        };

        let mut labels = Vec::new();
        if let Some(label_part) = parts.next() {
            for pair in label_part.split(',') {
                if let Some((k, v)) = pair.split_once('=') {
                    labels.push((k.to_string(), v.to_string()));
                }
            }
        }

        Ok(Self { kind, name, labels })
    }
}
