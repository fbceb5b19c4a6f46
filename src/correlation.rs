//! # Correlation Detector
//! Pearson correlation between two index-aligned metric histories plus a
//! lag estimate from an explicit time-shifted search.
//!
//! Conventions:
//! - Both series are read oldest-first (sorted by timestamp, ties keep order).
//! - A lag of `k` pairs `a[i]` with `b[i + k]`: B follows A by `k` samples.
//! - Pairs with a missing value on either side are dropped pairwise.
//! - Too few pairs or zero variance give a neutral result, never an error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::CorrelationConfig;
use crate::types::MetricSample;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// `|r|` at the reported lag, in `[0,1]`.
    pub strength: f64,
    /// `+1`, `-1`, or `0` when `r == 0` or undefined.
    pub direction: i8,
    pub lag_days: usize,
    /// Aligned pairs behind the reported coefficient.
    pub pairs: usize,
}

impl CorrelationResult {
    pub fn neutral() -> Self {
        Self {
            strength: 0.0,
            direction: 0,
            lag_days: 0,
            pairs: 0,
        }
    }
}

/// Pearson `r` over `(x, y)` pairs. `None` when fewer than two pairs or
/// either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let (sx, sy) = pairs
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mx, my) = (sx / n, sy / n);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = sxx.sqrt() * syy.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Correlate `series_a` with `series_b`, optionally negating B first.
pub fn detect_correlation(
    cfg: &CorrelationConfig,
    series_a: &[MetricSample],
    series_b: &[MetricSample],
    invert_b: bool,
) -> CorrelationResult {
    if series_a.len() != series_b.len() {
        warn!(
            target: "engine",
            len_a = series_a.len(),
            len_b = series_b.len(),
            "correlation: series lengths differ, pairing up to the shorter one"
        );
    }

    let a = chronological_values(series_a, false);
    let b = chronological_values(series_b, invert_b);
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);

    let zero = lagged_pairs(a, b, 0);
    if zero.len() < cfg.min_pairs {
        debug!(target: "engine", pairs = zero.len(), "correlation: not enough aligned pairs");
        return CorrelationResult::neutral();
    }
    let r0 = pearson(&zero).unwrap_or(0.0);

    // Strongest shifted candidate with enough support. Gaps in either series
    // make pair counts uneven across lags, so every lag is tried.
    let mut best: Option<(usize, f64, usize)> = None;
    for lag in 1..=cfg.max_lag_days {
        let pairs = lagged_pairs(a, b, lag);
        if pairs.len() < cfg.min_pairs {
            continue;
        }
        let Some(r) = pearson(&pairs) else { continue };
        if best.map_or(true, |(_, br, _)| r.abs() > br.abs()) {
            best = Some((lag, r, pairs.len()));
        }
    }

    // A shifted lag must beat zero lag by a margin to be reported.
    let (lag, r, n) = match best {
        Some((lag, r, n)) if r.abs() >= r0.abs() + cfg.min_lag_gain => (lag, r, n),
        _ => (0, r0, zero.len()),
    };

    let direction = if r > 0.0 {
        1
    } else if r < 0.0 {
        -1
    } else {
        0
    };
    debug!(target: "engine", r0, r, lag, pairs = n, invert_b, "correlation computed");

    CorrelationResult {
        strength: r.abs().min(1.0),
        direction,
        lag_days: lag,
        pairs: n,
    }
}

fn chronological_values(series: &[MetricSample], negate: bool) -> Vec<Option<f64>> {
    let mut ordered: Vec<&MetricSample> = series.iter().collect();
    ordered.sort_by(|x, y| x.timestamp.cmp(&y.timestamp));
    ordered
        .into_iter()
        .map(|s| {
            s.value
                .filter(|v| v.is_finite())
                .map(|v| if negate { -v } else { v })
        })
        .collect()
}

fn lagged_pairs(a: &[Option<f64>], b: &[Option<f64>], lag: usize) -> Vec<(f64, f64)> {
    if lag >= b.len() {
        return Vec::new();
    }
    a.iter()
        .zip(b[lag..].iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect()
}

/// Pair two histories by UTC calendar day.
///
/// Days present in either input appear once in both outputs, stamped at
/// midnight UTC. Several observations on one day are averaged; a day missing
/// from one side gets `value: None` there.
pub fn align_by_day(
    series_a: &[MetricSample],
    series_b: &[MetricSample],
) -> (Vec<MetricSample>, Vec<MetricSample>) {
    #[derive(Default)]
    struct Day {
        a: (f64, usize),
        b: (f64, usize),
    }

    let mut days: BTreeMap<NaiveDate, Day> = BTreeMap::new();
    for s in series_a {
        let d = days.entry(s.timestamp.date_naive()).or_default();
        if let Some(v) = s.value.filter(|v| v.is_finite()) {
            d.a.0 += v;
            d.a.1 += 1;
        }
    }
    for s in series_b {
        let d = days.entry(s.timestamp.date_naive()).or_default();
        if let Some(v) = s.value.filter(|v| v.is_finite()) {
            d.b.0 += v;
            d.b.1 += 1;
        }
    }

    let name_a = series_a.first().map(|s| s.metric_name.clone()).unwrap_or_default();
    let name_b = series_b.first().map(|s| s.metric_name.clone()).unwrap_or_default();
    let mean = |(sum, n): (f64, usize)| if n > 0 { Some(sum / n as f64) } else { None };

    let mut out_a = Vec::with_capacity(days.len());
    let mut out_b = Vec::with_capacity(days.len());
    for (date, d) in days {
        let ts = midnight_utc(date);
        out_a.push(MetricSample::new(ts, name_a.clone(), mean(d.a)));
        out_b.push(MetricSample::new(ts, name_b.clone(), mean(d.b)));
    }
    (out_a, out_b)
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(chrono::NaiveTime::MIN), Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// Oldest-first daily series starting at 2025-04-01.
    fn daily(metric: &str, values: &[Option<f64>]) -> Vec<MetricSample> {
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| MetricSample::new(start + Duration::days(i as i64), metric, *v))
            .collect()
    }

    fn some(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().copied().map(Some).collect()
    }

    const BASE: [f64; 12] = [1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0, 7.0, 6.0, 10.0, 2.0, 5.0];

    #[test]
    fn identical_series_are_perfectly_correlated() {
        let cfg = CorrelationConfig::default();
        let a = daily("stress", &some(&BASE[..6]));
        let r = detect_correlation(&cfg, &a, &a, false);
        assert!((r.strength - 1.0).abs() < 1e-12);
        assert_eq!(r.direction, 1);
        assert_eq!(r.lag_days, 0);
    }

    #[test]
    fn negated_series_is_perfectly_anti_correlated() {
        let cfg = CorrelationConfig::default();
        let a = daily("stress", &some(&BASE));
        let neg: Vec<f64> = BASE.iter().map(|v| -v).collect();
        let b = daily("fatigue", &some(&neg));
        let r = detect_correlation(&cfg, &a, &b, false);
        assert!((r.strength - 1.0).abs() < 1e-12);
        assert_eq!(r.direction, -1);

        // Inverting B flips it back.
        let r = detect_correlation(&cfg, &a, &b, true);
        assert_eq!(r.direction, 1);
    }

    #[test]
    fn too_few_pairs_is_neutral() {
        let cfg = CorrelationConfig::default();
        let a = daily("pain", &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)]);
        let b = daily("stress", &[Some(1.0), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)]);
        // Only indices 0, 3, 4, 5 are complete.
        assert_eq!(detect_correlation(&cfg, &a, &b, false), CorrelationResult::neutral());
    }

    #[test]
    fn zero_variance_is_neutral_strength() {
        let cfg = CorrelationConfig::default();
        let a = daily("hydration", &some(&[2.0; 7]));
        let b = daily("pain", &some(&BASE[..7]));
        let r = detect_correlation(&cfg, &a, &b, false);
        assert_eq!(r.strength, 0.0);
        assert_eq!(r.direction, 0);
        assert_eq!(r.lag_days, 0);
    }

    #[test]
    fn finds_shifted_response() {
        let cfg = CorrelationConfig::default();
        // B repeats A two days later.
        let mut shifted = vec![4.0, 4.0];
        shifted.extend_from_slice(&BASE[..10]);
        let a = daily("hydration", &some(&BASE));
        let b = daily("fatigue", &some(&shifted));
        let r = detect_correlation(&cfg, &a, &b, false);
        assert_eq!(r.lag_days, 2);
        assert_eq!(r.direction, 1);
        assert!((r.strength - 1.0).abs() < 1e-12);
        assert_eq!(r.pairs, 10);
    }

    #[test]
    fn every_other_day_logging_still_finds_the_lag() {
        let cfg = CorrelationConfig::default();
        // A is logged on even days only; B repeats A two days later.
        let logged = [1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0, 7.0];
        let mut a = vec![None; 16];
        let mut b = vec![None; 16];
        for (k, v) in logged.iter().enumerate() {
            a[2 * k] = Some(*v);
            if 2 * k + 2 < 16 {
                b[2 * k + 2] = Some(*v);
            }
        }
        b[0] = Some(4.0);
        let r = detect_correlation(&cfg, &daily("hydration", &a), &daily("fatigue", &b), false);
        // lag 1 has no complete pairs at all
        assert_eq!(r.lag_days, 2);
        assert_eq!(r.direction, 1);
        assert!((r.strength - 1.0).abs() < 1e-12);
        assert_eq!(r.pairs, 7);
    }

    #[test]
    fn lag_needs_a_material_gain() {
        let cfg = CorrelationConfig {
            min_lag_gain: 1.5,
            ..Default::default()
        };
        let mut shifted = vec![4.0, 4.0];
        shifted.extend_from_slice(&BASE[..10]);
        let a = daily("hydration", &some(&BASE));
        let b = daily("fatigue", &some(&shifted));
        let r = detect_correlation(&cfg, &a, &b, false);
        assert_eq!(r.lag_days, 0);
        assert_eq!(r.pairs, 12);
        assert!(r.strength < 1.0);
    }

    #[test]
    fn pearson_guards_degenerate_input() {
        assert_eq!(pearson(&[]), None);
        assert_eq!(pearson(&[(1.0, 2.0)]), None);
        assert_eq!(pearson(&[(1.0, 2.0), (1.0, 3.0)]), None);
    }

    #[test]
    fn align_by_day_pairs_and_fills_gaps() {
        let t = |d: u32, h: u32| Utc.with_ymd_and_hms(2025, 4, d, h, 0, 0).unwrap();
        let a = vec![
            MetricSample::new(t(1, 8), "hydration", Some(1.0)),
            MetricSample::new(t(1, 20), "hydration", Some(2.0)),
            MetricSample::new(t(3, 8), "hydration", Some(2.5)),
        ];
        let b = vec![
            MetricSample::new(t(2, 9), "pain", Some(4.0)),
            MetricSample::new(t(3, 9), "pain", None),
        ];
        let (ax, bx) = align_by_day(&a, &b);
        assert_eq!(ax.len(), 3);
        assert_eq!(bx.len(), 3);
        assert_eq!(ax[0].value, Some(1.5));
        assert_eq!(bx[0].value, None);
        assert_eq!(ax[1].value, None);
        assert_eq!(bx[1].value, Some(4.0));
        assert_eq!(ax[2].value, Some(2.5));
        assert_eq!(bx[2].value, None);
        assert_eq!(ax[1].timestamp, bx[1].timestamp);
        assert_eq!(ax[0].metric_name, "hydration");
        assert_eq!(bx[0].metric_name, "pain");
    }
}
