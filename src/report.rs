//! Latency reporting backed by an HDR histogram.
//!
//! Measurement stays outside the primitives: binaries and benches record
//! [`Duration`]s here and print or export the summary afterwards.

use crate::types::Duration;
use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid histogram bounds: {0:?}")]
    Bounds(hdrhistogram::CreationError),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Latency distribution for one measured operation
pub struct LatencyReport {
    label: String,
    histogram: Histogram<u64>,
}

impl LatencyReport {
    /// Track values from 1 ns to `max_ns` with 3 significant digits.
    /// Larger samples are clamped to `max_ns`.
    pub fn new(label: impl Into<String>, max_ns: u64) -> Result<Self, ReportError> {
        let histogram = Histogram::new_with_bounds(1, max_ns, 3).map_err(ReportError::Bounds)?;
        Ok(Self {
            label: label.into(),
            histogram,
        })
    }

    #[inline]
    pub fn record(&mut self, elapsed: Duration) {
        self.histogram.saturating_record(elapsed.get());
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Snapshot of the distribution
    pub fn summary(&self) -> LatencySummary {
        let h = &self.histogram;
        LatencySummary {
            label: self.label.clone(),
            count: h.len(),
            min: h.min(),
            p50: h.value_at_quantile(0.50),
            p90: h.value_at_quantile(0.90),
            p99: h.value_at_quantile(0.99),
            p999: h.value_at_quantile(0.999),
            p9999: h.value_at_quantile(0.9999),
            max: h.max(),
            mean: h.mean(),
            generated_at: Utc::now(),
        }
    }

    /// Non-empty power-of-two buckets as `(upper bound ns, count)`
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        if self.histogram.is_empty() {
            return Vec::new();
        }
        self.histogram
            .iter_log(1, 2.0)
            .filter(|v| v.count_since_last_iteration() > 0)
            .map(|v| (v.value_iterated_to(), v.count_since_last_iteration()))
            .collect()
    }
}

/// One row of a latency report, in nanoseconds
#[derive(Clone, Debug, Serialize)]
pub struct LatencySummary {
    pub label: String,
    pub count: u64,
    pub min: u64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub p999: u64,
    pub p9999: u64,
    pub max: u64,
    pub mean: f64,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} (ns) ===", self.label)?;
        writeln!(f, "Samples: {}", self.count)?;
        writeln!(f, "Min:    {:6} ns", self.min)?;
        writeln!(f, "P50:    {:6} ns", self.p50)?;
        writeln!(f, "P90:    {:6} ns", self.p90)?;
        writeln!(f, "P99:    {:6} ns", self.p99)?;
        writeln!(f, "P99.9:  {:6} ns", self.p999)?;
        writeln!(f, "P99.99: {:6} ns", self.p9999)?;
        write!(f, "Max:    {:6} ns", self.max)
    }
}

/// Write summaries as CSV with a header row
pub fn write_csv(path: impl AsRef<Path>, rows: &[LatencySummary]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
