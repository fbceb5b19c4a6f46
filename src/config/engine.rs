//! Engine tuning surface: normalization bounds, factor weights, band cutoffs,
//! trend thresholds, correlation search limits and recommendation thresholds.
//!
//! TOML shape (every key optional, missing keys fall back to defaults):
//! ```toml
//! [normalization]
//! systolic = { low = 120.0, high = 160.0, polarity = "higher_is_riskier" }
//!
//! [weights]
//! bp = 0.30
//!
//! [bands]
//! elevated_from = 40
//! high_from = 70
//!
//! [trend.thresholds]
//! hydration = 5.0
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::normalize::{NormalizationBand, Polarity};

pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_ENGINE_CONFIG_PATH: &str = "HEALTH_ENGINE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub weights: FactorWeights,
    #[serde(default)]
    pub bands: BandCutoffs,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub recommendation: RecommendationThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    #[serde(default = "default_systolic")]
    pub systolic: NormalizationBand,
    #[serde(default = "default_diastolic")]
    pub diastolic: NormalizationBand,
    /// Share of systolic pressure in the mean arterial pressure proxy.
    #[serde(default = "default_map_systolic_weight")]
    pub map_systolic_weight: f64,
    #[serde(default = "default_hydration_ratio")]
    pub hydration_ratio: NormalizationBand,
    #[serde(default = "default_bmi")]
    pub bmi: NormalizationBand,
    #[serde(default = "default_rating_max")]
    pub rating_max: f64,
}

fn default_systolic() -> NormalizationBand {
    NormalizationBand::new(120.0, 160.0, Polarity::HigherIsRiskier)
}
fn default_diastolic() -> NormalizationBand {
    NormalizationBand::new(80.0, 100.0, Polarity::HigherIsRiskier)
}
fn default_map_systolic_weight() -> f64 {
    1.0 / 3.0
}
fn default_hydration_ratio() -> NormalizationBand {
    NormalizationBand::new(0.0, 1.0, Polarity::LowerIsRiskier)
}
fn default_bmi() -> NormalizationBand {
    NormalizationBand::new(25.0, 35.0, Polarity::HigherIsRiskier)
}
fn default_rating_max() -> f64 {
    10.0
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            systolic: default_systolic(),
            diastolic: default_diastolic(),
            map_systolic_weight: default_map_systolic_weight(),
            hydration_ratio: default_hydration_ratio(),
            bmi: default_bmi(),
            rating_max: default_rating_max(),
        }
    }
}

/// Relative weights of the composite factors. Only weights of present
/// factors enter the denominator, so they need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    #[serde(default = "default_w_bp")]
    pub bp: f64,
    #[serde(default = "default_w_hydration")]
    pub hydration: f64,
    #[serde(default = "default_w_fatigue")]
    pub fatigue: f64,
    #[serde(default = "default_w_pain")]
    pub pain: f64,
    #[serde(default = "default_w_stress")]
    pub stress: f64,
    #[serde(default = "default_w_weight")]
    pub weight: f64,
}

fn default_w_bp() -> f64 {
    0.30
}
fn default_w_hydration() -> f64 {
    0.25
}
fn default_w_fatigue() -> f64 {
    0.15
}
fn default_w_pain() -> f64 {
    0.15
}
fn default_w_stress() -> f64 {
    0.10
}
fn default_w_weight() -> f64 {
    0.05
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            bp: default_w_bp(),
            hydration: default_w_hydration(),
            fatigue: default_w_fatigue(),
            pain: default_w_pain(),
            stress: default_w_stress(),
            weight: default_w_weight(),
        }
    }
}

/// `score < elevated_from` is stable, `score >= high_from` is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCutoffs {
    #[serde(default = "default_elevated_from")]
    pub elevated_from: u8,
    #[serde(default = "default_high_from")]
    pub high_from: u8,
}

fn default_elevated_from() -> u8 {
    40
}
fn default_high_from() -> u8 {
    70
}

impl Default for BandCutoffs {
    fn default() -> Self {
        Self {
            elevated_from: default_elevated_from(),
            high_from: default_high_from(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_max_window_days")]
    pub max_window_days: usize,
    #[serde(default = "default_trend_min_samples")]
    pub min_samples: usize,
    /// Percent change a metric must exceed before it counts as a trend.
    #[serde(default = "default_trend_thresholds")]
    pub thresholds: BTreeMap<String, f64>,
}

fn default_max_window_days() -> usize {
    7
}
fn default_trend_min_samples() -> usize {
    3
}
fn default_trend_thresholds() -> BTreeMap<String, f64> {
    let mut m = BTreeMap::new();
    m.insert("hydration".to_string(), 5.0);
    for k in ["systolic_bp", "diastolic_bp", "blood_pressure", "egfr"] {
        m.insert(k.to_string(), 3.0);
    }
    for k in ["fatigue", "pain", "stress"] {
        m.insert(k.to_string(), 10.0);
    }
    m
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            max_window_days: default_max_window_days(),
            min_samples: default_trend_min_samples(),
            thresholds: default_trend_thresholds(),
        }
    }
}

impl TrendConfig {
    /// Percent threshold for `metric_name` (case-insensitive).
    pub fn threshold_for(&self, metric_name: &str) -> Result<f64> {
        let key = metric_key(metric_name);
        self.thresholds.get(&key).copied().ok_or_else(|| {
            EngineError::config(format!(
                "unknown metric `{}` (known: {})",
                metric_name,
                self.thresholds.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }
}

/// Lowercase, trimmed, spaces and dashes folded into underscores.
pub(crate) fn metric_key(name: &str) -> String {
    name.trim()
        .to_ascii_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    #[serde(default = "default_min_pairs")]
    pub min_pairs: usize,
    #[serde(default = "default_max_lag_days")]
    pub max_lag_days: usize,
    /// Improvement in |r| a non-zero lag needs over the zero-lag value.
    #[serde(default = "default_min_lag_gain")]
    pub min_lag_gain: f64,
}

fn default_min_pairs() -> usize {
    5
}
fn default_max_lag_days() -> usize {
    3
}
fn default_min_lag_gain() -> f64 {
    0.05
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_pairs: default_min_pairs(),
            max_lag_days: default_max_lag_days(),
            min_lag_gain: default_min_lag_gain(),
        }
    }
}

/// Inclusive 0–10 thresholds that make the recommendation trigger fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    #[serde(default = "default_rec_fatigue")]
    pub fatigue: u8,
    #[serde(default = "default_rec_stress")]
    pub stress: u8,
    #[serde(default = "default_rec_pain")]
    pub pain: u8,
}

fn default_rec_fatigue() -> u8 {
    5
}
fn default_rec_stress() -> u8 {
    5
}
fn default_rec_pain() -> u8 {
    3
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            fatigue: default_rec_fatigue(),
            stress: default_rec_stress(),
            pain: default_rec_pain(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(toml_str)
            .map_err(|e| EngineError::config(format!("engine config TOML: {e}")))?;
        // Normalize threshold keys so lookups match `metric_key`.
        cfg.trend.thresholds = cfg
            .trend
            .thresholds
            .into_iter()
            .map(|(k, v)| (metric_key(&k), v))
            .collect();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let cfg = Self::from_toml_str(&content)
            .with_context(|| format!("loading engine config from {}", path.display()))?;
        info!(target: "engine", path = %path.display(), "engine config loaded");
        Ok(cfg)
    }

    /// Resolve the config using env var + fallbacks:
    /// 1) $HEALTH_ENGINE_CONFIG_PATH (must exist)
    /// 2) config/engine.toml
    /// 3) built-in defaults
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = std::env::var(ENV_ENGINE_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!(
                    "{ENV_ENGINE_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                );
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_ENGINE_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        debug!(target: "engine", "no engine config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Fail fast on settings the arithmetic cannot work with.
    pub fn validate(&self) -> Result<()> {
        let n = &self.normalization;
        for (name, band) in [
            ("systolic", &n.systolic),
            ("diastolic", &n.diastolic),
            ("hydration_ratio", &n.hydration_ratio),
            ("bmi", &n.bmi),
        ] {
            band.validate().map_err(|e| match e {
                EngineError::Configuration(m) => {
                    EngineError::config(format!("normalization.{name}: {m}"))
                }
                other => other,
            })?;
        }
        if !(0.0..=1.0).contains(&n.map_systolic_weight) {
            return Err(EngineError::config(format!(
                "normalization.map_systolic_weight must be within [0,1], got {}",
                n.map_systolic_weight
            )));
        }
        if !(n.rating_max.is_finite() && n.rating_max > 0.0) {
            return Err(EngineError::config("normalization.rating_max must be > 0"));
        }

        let w = &self.weights;
        for (name, v) in [
            ("bp", w.bp),
            ("hydration", w.hydration),
            ("fatigue", w.fatigue),
            ("pain", w.pain),
            ("stress", w.stress),
            ("weight", w.weight),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(EngineError::config(format!(
                    "weights.{name} must be a finite non-negative number, got {v}"
                )));
            }
        }
        if w.bp <= 0.0 || w.hydration <= 0.0 {
            return Err(EngineError::config(
                "weights.bp and weights.hydration must be positive",
            ));
        }

        let b = &self.bands;
        if !(b.elevated_from > 0 && b.elevated_from < b.high_from && b.high_from <= 100) {
            return Err(EngineError::config(format!(
                "bands must satisfy 0 < elevated_from < high_from <= 100, got {}/{}",
                b.elevated_from, b.high_from
            )));
        }

        let t = &self.trend;
        if t.max_window_days == 0 || t.min_samples < 2 {
            return Err(EngineError::config(
                "trend.max_window_days must be >= 1 and trend.min_samples >= 2",
            ));
        }
        if let Some((k, v)) = t
            .thresholds
            .iter()
            .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
        {
            return Err(EngineError::config(format!(
                "trend.thresholds.{k} must be a finite non-negative percent, got {v}"
            )));
        }

        let c = &self.correlation;
        if c.min_pairs < 3 {
            return Err(EngineError::config("correlation.min_pairs must be >= 3"));
        }
        if !(c.min_lag_gain.is_finite() && c.min_lag_gain >= 0.0) {
            return Err(EngineError::config(
                "correlation.min_lag_gain must be a finite non-negative number",
            ));
        }

        let r = &self.recommendation;
        if r.fatigue > 10 || r.stress > 10 || r.pain > 10 {
            return Err(EngineError::config(
                "recommendation thresholds must be within 0..=10",
            ));
        }
        Ok(())
    }
}
