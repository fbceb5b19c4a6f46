//! # Score Normalizer
//! Maps raw physiological and symptom values onto `[0,1]` risk sub-scores.
//!
//! Every function here is pure. A missing input (`None`) propagates as
//! `None` so the composite scorer can exclude the factor instead of
//! treating it as zero risk.

use serde::{Deserialize, Serialize};

use crate::config::NormalizationConfig;
use crate::error::{EngineError, Result};

/// Whether larger raw values mean more or less risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// e.g. blood pressure, BMI
    HigherIsRiskier,
    /// e.g. hydration ratio
    LowerIsRiskier,
}

/// A `[low, high]` interpolation band with its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationBand {
    pub low: f64,
    pub high: f64,
    #[serde(default = "default_polarity")]
    pub polarity: Polarity,
}

fn default_polarity() -> Polarity {
    Polarity::HigherIsRiskier
}

impl NormalizationBand {
    pub const fn new(low: f64, high: f64, polarity: Polarity) -> Self {
        Self {
            low,
            high,
            polarity,
        }
    }

    /// Bounds must be finite and strictly ordered.
    pub fn validate(&self) -> Result<()> {
        check_bounds(self.low, self.high)?;
        if self.low > self.high {
            return Err(EngineError::config(format!(
                "low_bound {} is above high_bound {}",
                self.low, self.high
            )));
        }
        Ok(())
    }

    pub fn apply(&self, value: Option<f64>) -> Result<Option<f64>> {
        normalize(value, self.low, self.high, self.polarity)
    }
}

fn check_bounds(low: f64, high: f64) -> Result<()> {
    if !(low.is_finite() && high.is_finite()) {
        return Err(EngineError::config(format!(
            "normalization bounds must be finite, got [{low}, {high}]"
        )));
    }
    if low == high {
        return Err(EngineError::config(format!(
            "degenerate normalization bounds: low_bound == high_bound == {low}"
        )));
    }
    Ok(())
}

/// Linear interpolation between the bounds, clamped to `[0,1]`.
///
/// `None` (and NaN, which is never an observation) yields `Ok(None)`.
/// Equal or non-finite bounds are a configuration error.
pub fn normalize(
    value: Option<f64>,
    low_bound: f64,
    high_bound: f64,
    polarity: Polarity,
) -> Result<Option<f64>> {
    check_bounds(low_bound, high_bound)?;
    let v = match value {
        Some(v) if !v.is_nan() => v,
        _ => return Ok(None),
    };
    let t = clamp01((v - low_bound) / (high_bound - low_bound));
    Ok(Some(match polarity {
        Polarity::HigherIsRiskier => t,
        Polarity::LowerIsRiskier => 1.0 - t,
    }))
}

/// Clamp to [0.0, 1.0].
pub(crate) fn clamp01(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}

/// Body-mass index, `None` unless both measurements are positive.
pub fn bmi(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<f64> {
    match (height_cm, weight_kg) {
        (Some(h), Some(w)) if h > 0.0 && w > 0.0 && h.is_finite() && w.is_finite() => {
            let m = h / 100.0;
            Some(w / (m * m))
        }
        _ => None,
    }
}

/// Factor-level normalizers driven by [`NormalizationConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ScoreNormalizer<'a> {
    cfg: &'a NormalizationConfig,
}

impl<'a> ScoreNormalizer<'a> {
    pub fn new(cfg: &'a NormalizationConfig) -> Self {
        Self { cfg }
    }

    /// Mean arterial pressure proxy: `w*systolic + (1-w)*diastolic`.
    pub fn map_proxy(&self, systolic: f64, diastolic: f64) -> f64 {
        let w = self.cfg.map_systolic_weight;
        w * systolic + (1.0 - w) * diastolic
    }

    /// Blood pressure risk against the band spanned by the systolic and
    /// diastolic bounds combined into the same MAP proxy.
    pub fn bp_norm(&self, systolic: Option<f64>, diastolic: Option<f64>) -> Result<Option<f64>> {
        let (Some(s), Some(d)) = (systolic, diastolic) else {
            return Ok(None);
        };
        let low = self.map_proxy(self.cfg.systolic.low, self.cfg.diastolic.low);
        let high = self.map_proxy(self.cfg.systolic.high, self.cfg.diastolic.high);
        normalize(
            Some(self.map_proxy(s, d)),
            low,
            high,
            Polarity::HigherIsRiskier,
        )
    }

    /// Hydration risk from `intake / target`; ratios >= 1 carry no risk.
    /// A non-positive target cannot produce a ratio and yields `None`.
    pub fn hydro_norm(&self, intake_l: Option<f64>, target_l: Option<f64>) -> Result<Option<f64>> {
        let ratio = match (intake_l, target_l) {
            (Some(i), Some(t)) if t > 0.0 => Some(i.max(0.0) / t),
            _ => None,
        };
        self.cfg.hydration_ratio.apply(ratio)
    }

    /// 0–10 self-rating divided by the rating scale.
    pub fn rating_norm(&self, rating: Option<u8>) -> Result<Option<f64>> {
        normalize(
            rating.map(f64::from),
            0.0,
            self.cfg.rating_max,
            Polarity::HigherIsRiskier,
        )
    }

    pub fn weight_norm(&self, bmi: Option<f64>) -> Result<Option<f64>> {
        self.cfg.bmi.apply(bmi)
    }
}
