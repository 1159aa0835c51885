//! Histogram reduction.
//!
//! Turns a raw sample buffer into the summary statistics persisted in a
//! snapshot record. Percentiles use the nearest-rank method (no
//! interpolation): over the ascending sort, the p-th percentile is the
//! value at index `ceil(count * p) - 1`, clamped to the valid range.

/// Summary statistics for one histogram interval.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSummary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Reduce a sample buffer to its summary. An empty buffer yields `None`:
/// a histogram with no samples in the interval contributes no record.
pub fn reduce(samples: &[f64]) -> Option<HistogramSummary> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();

    Some(HistogramSummary {
        count: count as u64,
        sum,
        min: sorted[0],
        max: sorted[count - 1],
        avg: sum / count as f64,
        p50: nearest_rank(&sorted, 0.50),
        p95: nearest_rank(&sorted, 0.95),
        p99: nearest_rank(&sorted, 0.99),
    })
}

fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let index = (sorted.len() as f64 * percentile).ceil() as usize;
    let index = index.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}
