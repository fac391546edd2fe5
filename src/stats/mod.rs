//! Descriptive statistics over per-image recognition latency.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Latency distribution of a run, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Number of measurements.
    pub count: usize,
    /// Mean latency.
    pub mean_ms: f64,
    /// Median latency.
    pub median_ms: f64,
    /// Fastest request.
    pub min_ms: f64,
    /// Slowest request.
    pub max_ms: f64,
    /// 95th percentile.
    pub p95_ms: f64,
}

impl LatencySummary {
    /// Summarize a set of request durations.
    ///
    /// Returns `None` if there are no measurements.
    #[must_use]
    pub fn compute(durations: &[Duration]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        Some(Self {
            count,
            mean_ms: sorted.iter().sum::<f64>() / count as f64,
            median_ms: percentile_sorted(&sorted, 0.5),
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            p95_ms: percentile_sorted(&sorted, 0.95),
        })
    }
}

/// Linear-interpolated percentile of sorted data; `p` in `0.0..=1.0`.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let p = p.clamp(0.0, 1.0);
    let idx = p * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}
