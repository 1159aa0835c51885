//! Thread-safe metric accumulation.
//!
//! All three accumulator maps live behind one mutex. The drain step must be
//! atomic with respect to concurrent writers: no reader may observe a state
//! where some entries have been cleared and others not, and a write landing
//! at drain time is either included in this cycle or deferred to the next,
//! never duplicated or lost. The critical sections are short (map mutation,
//! no I/O), so the coarse lock is acceptable at instrumentation-path rates.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::warn;

use meterline_core::{MetricKey, MetricKind};

/// Maximum samples retained per histogram between flushes. On overflow the
/// oldest sample is evicted first.
pub const HISTOGRAM_CAPACITY: usize = 1000;

#[derive(Default)]
struct Accumulators {
    counters: HashMap<String, f64>,
    gauges: HashMap<String, f64>,
    histograms: HashMap<String, VecDeque<f64>>,
}

/// Point-in-time coherent copy of the accumulators, produced by one drain.
///
/// Counter values are the deltas accumulated since the previous drain;
/// histogram sample vectors are the full buffers for the interval.
#[derive(Debug, Default)]
pub struct Drained {
    pub counters: Vec<(String, f64)>,
    pub gauges: Vec<(String, f64)>,
    pub histograms: Vec<(String, Vec<f64>)>,
}

impl Drained {
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty() && self.histograms.is_empty()
    }
}

/// Accumulates raw counter, gauge, and histogram samples in memory.
///
/// Cheap to clone; all clones share the same accumulators. Series are
/// created lazily on first write, keyed by their canonical snapshot key,
/// and live for the process lifetime.
#[derive(Clone, Default)]
pub struct Collector {
    inner: Arc<Mutex<Accumulators>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to a counter. Negative deltas are ignored.
    pub fn increment_counter(&self, name: &str, delta: f64, labels: &[(&str, &str)]) {
        if delta < 0.0 {
            warn!(name, delta, "ignoring negative counter delta");
            return;
        }
        let key = MetricKey::new(MetricKind::Counter, name, labels).encode();
        let mut inner = self.lock();
        *inner.counters.entry(key).or_insert(0.0) += delta;
    }

    /// Set a gauge to `value`. Last write wins.
    pub fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        let key = MetricKey::new(MetricKind::Gauge, name, labels).encode();
        let mut inner = self.lock();
        inner.gauges.insert(key, value);
    }

    /// Append a sample to a histogram buffer, evicting the oldest sample
    /// once the buffer holds [`HISTOGRAM_CAPACITY`] values.
    pub fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        let key = MetricKey::new(MetricKind::Histogram, name, labels).encode();
        let mut inner = self.lock();
        let buffer = inner.histograms.entry(key).or_default();
        if buffer.len() >= HISTOGRAM_CAPACITY {
            buffer.pop_front();
        }
        buffer.push_back(value);
    }

    /// Drain the accumulators under one critical section.
    ///
    /// Counters are copied out and reset; gauges are copied and left in
    /// place so they keep reporting their level every cycle; histogram
    /// buffers are copied and cleared regardless of what happens to the
    /// copy afterwards.
    pub fn drain(&self) -> Drained {
        let mut inner = self.lock();

        let counters = std::mem::take(&mut inner.counters).into_iter().collect();
        let gauges = inner.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let histograms = inner
            .histograms
            .iter_mut()
            .map(|(k, buffer)| (k.clone(), buffer.drain(..).collect()))
            .collect();

        Drained {
            counters,
            gauges,
            histograms,
        }
    }

    /// Current accumulated value of a counter, if the series exists.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let key = MetricKey::new(MetricKind::Counter, name, labels).encode();
        self.lock().counters.get(&key).copied()
    }

    /// Current value of a gauge, if the series exists.
    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let key = MetricKey::new(MetricKind::Gauge, name, labels).encode();
        self.lock().gauges.get(&key).copied()
    }

    /// Number of buffered samples in a histogram series.
    pub fn histogram_depth(&self, name: &str, labels: &[(&str, &str)]) -> usize {
        let key = MetricKey::new(MetricKind::Histogram, name, labels).encode();
        self.lock()
            .histograms
            .get(&key)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Accumulators> {
        self.inner.lock().expect("collector lock poisoned")
    }
}
