//! # Trend Analyzer
//! Splits the most recent window of a metric history into a newer and an
//! older half and classifies the change between their means.
//!
//! Trends are advisory: short histories yield a neutral result, never an
//! error. Only an unknown metric name is rejected.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::engine::metric_key;
use crate::config::TrendConfig;
use crate::error::Result;
use crate::types::MetricSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    /// `|newer_mean - older_mean|`
    pub change_magnitude: f64,
    /// Number of samples the window actually covered.
    pub window_days: usize,
    /// Relative change against the older half; 0 when that mean is 0.
    pub percent_change: f64,
}

impl TrendResult {
    pub fn neutral() -> Self {
        Self {
            direction: TrendDirection::Stable,
            change_magnitude: 0.0,
            window_days: 0,
            percent_change: 0.0,
        }
    }
}

/// Classify the recent direction of `history`.
///
/// Samples are ordered newest-first by timestamp before windowing; ties keep
/// the supplier's order. `max_window_days` overrides the configured window
/// but is never smaller than `min_samples`.
pub fn analyze_trend(
    cfg: &TrendConfig,
    history: &[MetricSample],
    metric_name: &str,
    max_window_days: Option<usize>,
) -> Result<TrendResult> {
    let threshold = cfg.threshold_for(metric_name)?;

    if history.len() < cfg.min_samples {
        debug!(target: "engine", metric = metric_name, n = history.len(), "trend: not enough samples");
        return Ok(TrendResult::neutral());
    }

    let key = metric_key(metric_name);
    let foreign = history
        .iter()
        .filter(|s| metric_key(&s.metric_name) != key)
        .count();
    if foreign > 0 {
        warn!(target: "engine", metric = metric_name, foreign, "trend: history mixes metric names");
    }

    let mut ordered: Vec<&MetricSample> = history.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    // Both halves need at least one sample.
    let window = max_window_days
        .unwrap_or(cfg.max_window_days)
        .max(cfg.min_samples);
    let n = window.min(ordered.len());
    let slice = &ordered[..n];
    let split = n / 2;
    let (newer, older) = slice.split_at(split);

    let newer_mean = mean_observed(newer);
    let older_mean = mean_observed(older);
    let change = newer_mean - older_mean;
    let percent_change = if older_mean != 0.0 {
        change / older_mean * 100.0
    } else {
        0.0
    };

    let direction = if percent_change.abs() > threshold {
        if change > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    } else {
        TrendDirection::Stable
    };

    debug!(
        target: "engine",
        metric = metric_name,
        window = n,
        newer_mean,
        older_mean,
        percent_change,
        ?direction,
        "trend computed"
    );

    Ok(TrendResult {
        direction,
        change_magnitude: change.abs(),
        window_days: n,
        percent_change,
    })
}

/// Mean over observed values; a half with no observations counts as 0.
fn mean_observed(samples: &[&MetricSample]) -> f64 {
    let (sum, n) = samples
        .iter()
        .filter_map(|s| s.value.filter(|v| v.is_finite()))
        .fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    if n > 0 {
        sum / n as f64
    } else {
        0.0
    }
}
