//! Metrics collection and reporting using metrics-rs.
//!
//! The batch always records through the `metrics` facade; the values only go
//! somewhere when a recorder is installed (`--metrics` installs
//! [`CliRecorder`] and prints it at exit).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_histogram, histogram,
};
use parking_lot::RwLock;

use crate::scan::Classification;

// ============================================================================
// Metric descriptions
// ============================================================================

/// Initialize metric descriptions.
///
/// Call this once at startup to register metric descriptions.
pub fn init() {
    describe_counter!(
        "rvhex_files_converted_total",
        Unit::Count,
        "Files converted to .bin and .hex"
    );
    describe_counter!(
        "rvhex_files_failed_total",
        Unit::Count,
        "Files whose conversion failed"
    );
    describe_counter!(
        "rvhex_files_skipped_total",
        Unit::Count,
        "Files skipped before conversion"
    );
    describe_histogram!(
        "rvhex_tool_duration_seconds",
        Unit::Seconds,
        "External tool wall-clock time"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

/// Record a converted file.
pub fn record_converted() {
    counter!("rvhex_files_converted_total").increment(1);
}

/// Record a failed conversion, labelled by the failing step.
pub fn record_failed(step: &'static str) {
    counter!("rvhex_files_failed_total", "step" => step).increment(1);
}

/// Record a skipped file, labelled by why it was skipped.
pub fn record_skipped(reason: Classification) {
    counter!("rvhex_files_skipped_total", "reason" => reason.as_str()).increment(1);
}

/// Record how long one external tool invocation took.
pub fn record_tool(tool: &'static str, elapsed: Duration) {
    histogram!("rvhex_tool_duration_seconds", "tool" => tool).record(elapsed.as_secs_f64());
}

// ============================================================================
// In-memory recorder behind `--metrics`
// ============================================================================

/// Everything the recorder has seen, keyed by rendered metric key.
#[derive(Default)]
struct Store {
    counts: RwLock<HashMap<String, u64>>,
    durations: RwLock<HashMap<String, Vec<f64>>>,
}

/// Handle given out for one counter key.
struct StoredCounter {
    key: String,
    store: Arc<Store>,
}

impl metrics::CounterFn for StoredCounter {
    fn increment(&self, value: u64) {
        *self.store.counts.write().entry(self.key.clone()).or_default() += value;
    }

    fn absolute(&self, value: u64) {
        self.store.counts.write().insert(self.key.clone(), value);
    }
}

/// Handle given out for one histogram key.
struct StoredHistogram {
    key: String,
    store: Arc<Store>,
}

impl metrics::HistogramFn for StoredHistogram {
    fn record(&self, value: f64) {
        self.store
            .durations
            .write()
            .entry(self.key.clone())
            .or_default()
            .push(value);
    }
}

/// Keeps counters and tool durations in memory for the exit printout.
/// Gauges are dropped.
#[derive(Default)]
pub struct CliRecorder {
    store: Arc<Store>,
}

impl CliRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the global recorder; `None` if one is already set.
    #[must_use]
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = self.handle();
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }

    fn handle(&self) -> CliRecorderHandle {
        CliRecorderHandle {
            store: Arc::clone(&self.store),
        }
    }
}

/// `name` or `name{label=value,...}`.
fn render_key(key: &Key) -> String {
    let mut rendered = key.name().to_string();
    let mut labels = key.labels().peekable();
    if labels.peek().is_some() {
        let pairs: Vec<String> = labels.map(|l| format!("{}={}", l.key(), l.value())).collect();
        rendered = format!("{rendered}{{{}}}", pairs.join(","));
    }
    rendered
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(StoredCounter {
            key: render_key(key),
            store: Arc::clone(&self.store),
        }))
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(StoredHistogram {
            key: render_key(key),
            store: Arc::clone(&self.store),
        }))
    }
}

/// Read side of an installed [`CliRecorder`].
pub struct CliRecorderHandle {
    store: Arc<Store>,
}

impl CliRecorderHandle {
    /// Counter value by rendered key (`name{label=value}`).
    #[must_use]
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.store.counts.read().get(key).copied()
    }

    /// Samples recorded for a histogram key.
    #[must_use]
    pub fn samples(&self, key: &str) -> usize {
        self.store.durations.read().get(key).map_or(0, Vec::len)
    }

    /// Print counters, then per-tool duration stats.
    pub fn print_summary(&self) {
        let counts = self.store.counts.read();
        let durations = self.store.durations.read();

        if counts.is_empty() && durations.is_empty() {
            println!("No metrics collected.");
            return;
        }

        println!();
        println!("## Metrics Summary");

        if !counts.is_empty() {
            println!();
            println!("### Counters");
            let mut rows: Vec<_> = counts.iter().collect();
            rows.sort();
            for (key, value) in rows {
                println!("  {key}: {value}");
            }
        }

        let mut rows: Vec<_> = durations.iter().filter(|(_, v)| !v.is_empty()).collect();
        if !rows.is_empty() {
            rows.sort_by(|a, b| a.0.cmp(b.0));
            println!();
            println!("### Tool durations");
            for (key, values) in rows {
                let max = values.iter().copied().fold(0.0_f64, f64::max);
                let sum: f64 = values.iter().sum();
                #[allow(clippy::cast_precision_loss)]
                let avg = sum / values.len() as f64;
                println!(
                    "  {key}: count={}, total={sum:.3}s, avg={avg:.3}s, max={max:.3}s",
                    values.len()
                );
            }
        }
        println!();
    }
}
