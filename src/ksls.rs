//! # Composite Risk Scorer (KSLS)
//! Pure mapping `(KslsInput, config) -> KslsResult`. No I/O.
//!
//! Policy: blood pressure and hydration are mandatory; fatigue, pain,
//! stress and weight enter only when present. Weights are renormalized over
//! the present factors, so the score always spans 0–100.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BandCutoffs, EngineConfig};
use crate::error::{EngineError, Result};
use crate::normalize::{bmi, ScoreNormalizer};
use crate::types::Demographics;

/// Upper end of the self-report scale.
const RATING_MAX: u8 = 10;

/// Latest-known values for one scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KslsInput {
    #[serde(default)]
    pub systolic_bp: Option<f64>,
    #[serde(default)]
    pub diastolic_bp: Option<f64>,
    #[serde(default)]
    pub fluid_intake_liters: Option<f64>,
    #[serde(default)]
    pub fluid_target_liters: Option<f64>,
    #[serde(default)]
    pub fatigue: Option<u8>,
    #[serde(default)]
    pub pain: Option<u8>,
    #[serde(default)]
    pub stress: Option<u8>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

/// Normalized sub-scores actually consumed by the composite formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KslsFactors {
    pub bp_norm: f64,
    pub hydro_norm: f64,
    pub fatigue_norm: Option<f64>,
    pub pain_norm: Option<f64>,
    pub stress_norm: Option<f64>,
    pub weight_norm: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Stable,
    Elevated,
    High,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Stable => "stable",
            RiskBand::Elevated => "elevated",
            RiskBand::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KslsResult {
    pub score: u8,
    pub band: RiskBand,
    /// Rounded to one decimal; `None` when height or weight is unusable.
    pub bmi: Option<f64>,
    pub factors: KslsFactors,
}

/// Band for a 0–100 score. Cutoffs are inclusive lower bounds.
pub fn band_for(score: u8, cutoffs: &BandCutoffs) -> RiskBand {
    if score >= cutoffs.high_from {
        RiskBand::High
    } else if score >= cutoffs.elevated_from {
        RiskBand::Elevated
    } else {
        RiskBand::Stable
    }
}

fn check_ranges(input: &KslsInput, demographics: Option<&Demographics>) -> Result<()> {
    for (name, rating) in [
        ("fatigue", input.fatigue),
        ("pain", input.pain),
        ("stress", input.stress),
    ] {
        if let Some(v) = rating.filter(|v| *v > RATING_MAX) {
            return Err(EngineError::InvalidInput(format!(
                "{name} rating {v} is outside 0..={RATING_MAX}"
            )));
        }
    }
    if let Some(stage) = demographics
        .and_then(|d| d.ckd_stage)
        .filter(|s| !(1..=5).contains(s))
    {
        return Err(EngineError::InvalidInput(format!(
            "ckd_stage {stage} is outside 1..=5"
        )));
    }
    Ok(())
}

/// Compute the composite score. Fails with `InsufficientInput` when blood
/// pressure or hydration cannot be derived, and with `InvalidInput` when a
/// rating or the CKD stage is off its scale.
pub fn compute_ksls(
    cfg: &EngineConfig,
    input: &KslsInput,
    demographics: Option<&Demographics>,
) -> Result<KslsResult> {
    let mut missing = Vec::new();
    if input.systolic_bp.is_none() {
        missing.push("systolic_bp");
    }
    if input.diastolic_bp.is_none() {
        missing.push("diastolic_bp");
    }
    if input.fluid_intake_liters.is_none() {
        missing.push("fluid_intake_liters");
    }
    if !matches!(input.fluid_target_liters, Some(t) if t > 0.0) {
        missing.push("fluid_target_liters");
    }
    if !missing.is_empty() {
        return Err(EngineError::InsufficientInput { missing });
    }
    check_ranges(input, demographics)?;

    let n = ScoreNormalizer::new(&cfg.normalization);
    let bp_norm = n.bp_norm(input.systolic_bp, input.diastolic_bp)?;
    let hydro_norm = n.hydro_norm(input.fluid_intake_liters, input.fluid_target_liters)?;
    let (Some(bp_norm), Some(hydro_norm)) = (bp_norm, hydro_norm) else {
        // NaN readings normalize to None.
        return Err(EngineError::InsufficientInput {
            missing: vec!["blood_pressure_or_hydration"],
        });
    };

    let bmi_raw = bmi(input.height_cm, input.weight_kg);
    let factors = KslsFactors {
        bp_norm,
        hydro_norm,
        fatigue_norm: n.rating_norm(input.fatigue)?,
        pain_norm: n.rating_norm(input.pain)?,
        stress_norm: n.rating_norm(input.stress)?,
        weight_norm: n.weight_norm(bmi_raw)?,
    };

    let w = &cfg.weights;
    let weighted = [
        (Some(factors.bp_norm), w.bp),
        (Some(factors.hydro_norm), w.hydration),
        (factors.fatigue_norm, w.fatigue),
        (factors.pain_norm, w.pain),
        (factors.stress_norm, w.stress),
        (factors.weight_norm, w.weight),
    ];
    let (num, denom) = weighted
        .iter()
        .filter_map(|(f, w)| f.map(|f| (f * w, *w)))
        .fold((0.0f64, 0.0f64), |(n, d), (fw, w)| (n + fw, d + w));

    // denom > 0 is guaranteed by config validation (bp/hydration weights > 0).
    let raw = if denom > 0.0 { 100.0 * num / denom } else { 0.0 };
    let score = raw.round().clamp(0.0, 100.0) as u8;
    let band = band_for(score, &cfg.bands);

    if let Some(d) = demographics {
        debug!(
            target: "engine",
            ckd_stage = ?d.ckd_stage,
            age = ?d.age,
            "demographics supplied (informational only)"
        );
    }
    debug!(target: "engine", score, ?band, present_weight = denom, "ksls computed");

    Ok(KslsResult {
        score,
        band,
        bmi: bmi_raw.map(|b| (b * 10.0).round() / 10.0),
        factors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> KslsInput {
        KslsInput {
            systolic_bp: Some(120.0),
            diastolic_bp: Some(80.0),
            fluid_intake_liters: Some(2.0),
            fluid_target_liters: Some(2.0),
            ..Default::default()
        }
    }

    #[test]
    fn healthy_mandatory_only_scores_zero() {
        let r = compute_ksls(&EngineConfig::default(), &base(), None).unwrap();
        assert_eq!(r.score, 0);
        assert_eq!(r.band, RiskBand::Stable);
        assert_eq!(r.bmi, None);
        assert_eq!(r.factors.fatigue_norm, None);
    }

    #[test]
    fn worst_case_scores_hundred() {
        let input = KslsInput {
            systolic_bp: Some(190.0),
            diastolic_bp: Some(115.0),
            fluid_intake_liters: Some(0.0),
            fluid_target_liters: Some(2.0),
            fatigue: Some(10),
            pain: Some(10),
            stress: Some(10),
            height_cm: Some(160.0),
            weight_kg: Some(120.0),
        };
        let r = compute_ksls(&EngineConfig::default(), &input, None).unwrap();
        assert_eq!(r.score, 100);
        assert_eq!(r.band, RiskBand::High);
        assert!((r.bmi.unwrap() - 46.9).abs() < 1e-9);
    }

    #[test]
    fn missing_symptoms_renormalize_weights() {
        // Only bp (0.30) and hydration (0.25) present, both at 0.4 risk.
        let input = KslsInput {
            systolic_bp: Some(120.0),
            diastolic_bp: Some(96.0),
            fluid_intake_liters: Some(1.2),
            fluid_target_liters: Some(2.0),
            ..Default::default()
        };
        let r = compute_ksls(&EngineConfig::default(), &input, None).unwrap();
        assert_eq!(r.score, 40);
        assert_eq!(r.band, RiskBand::Elevated);
    }

    #[test]
    fn rated_zero_is_not_the_same_as_unrated() {
        let cfg = EngineConfig::default();
        let mut input = base();
        input.fluid_intake_liters = Some(1.0);
        let unrated = compute_ksls(&cfg, &input, None).unwrap();
        input.pain = Some(0);
        let rated_zero = compute_ksls(&cfg, &input, None).unwrap();
        assert!(rated_zero.score < unrated.score);
        assert_eq!(rated_zero.factors.pain_norm, Some(0.0));
    }

    #[test]
    fn band_boundaries_are_exact() {
        let c = BandCutoffs::default();
        assert_eq!(band_for(39, &c), RiskBand::Stable);
        assert_eq!(band_for(40, &c), RiskBand::Elevated);
        assert_eq!(band_for(69, &c), RiskBand::Elevated);
        assert_eq!(band_for(70, &c), RiskBand::High);
        assert_eq!(band_for(100, &c), RiskBand::High);
    }

    #[test]
    fn missing_mandatory_factors_fail_even_with_symptoms() {
        let input = KslsInput {
            systolic_bp: Some(130.0),
            diastolic_bp: Some(85.0),
            fluid_target_liters: Some(2.0),
            fatigue: Some(5),
            pain: Some(5),
            stress: Some(5),
            ..Default::default()
        };
        let err = compute_ksls(&EngineConfig::default(), &input, None).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientInput {
                missing: vec!["fluid_intake_liters"]
            }
        );

        let mut no_bp = base();
        no_bp.systolic_bp = None;
        no_bp.diastolic_bp = None;
        let err = compute_ksls(&EngineConfig::default(), &no_bp, None).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientInput {
                missing: vec!["systolic_bp", "diastolic_bp"]
            }
        );
    }

    #[test]
    fn off_scale_ratings_and_stage_are_rejected() {
        let cfg = EngineConfig::default();
        let mut input = base();
        input.pain = Some(15);
        let err = compute_ksls(&cfg, &input, None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(ref m) if m.contains("pain")));

        input.pain = Some(10);
        assert!(compute_ksls(&cfg, &input, None).is_ok());

        for stage in [0, 6] {
            let demo = Demographics {
                ckd_stage: Some(stage),
                ..Default::default()
            };
            let err = compute_ksls(&cfg, &input, Some(&demo)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidInput(ref m) if m.contains("ckd_stage")));
        }
    }

    #[test]
    fn demographics_do_not_change_the_score() {
        let cfg = EngineConfig::default();
        let mut input = base();
        input.stress = Some(6);
        let demo = Demographics {
            age: Some(58),
            ckd_stage: Some(3),
            ..Default::default()
        };
        let a = compute_ksls(&cfg, &input, None).unwrap();
        let b = compute_ksls(&cfg, &input, Some(&demo)).unwrap();
        assert_eq!(a, b);
    }
}
