// src/types.rs
//! Shared input types handed to the engine by its data suppliers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of one metric. `value: None` means "not observed",
/// which is distinct from an observed zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub metric_name: String,
    pub value: Option<f64>,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>, metric_name: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            timestamp,
            metric_name: metric_name.into(),
            value,
        }
    }
}

/// Sex assigned at birth, as far as the eGFR equation needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Lenient parse: "female"/"f"/"woman" and "male"/"m"/"man".
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" | "woman" => Some(Sex::Female),
            "male" | "m" | "man" => Some(Sex::Male),
            _ => None,
        }
    }
}

/// Optional patient context. Accepted by the composite scorer but not used
/// by its arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub race_ethnicity: Option<String>,
    /// CKD stage 1–5.
    #[serde(default)]
    pub ckd_stage: Option<u8>,
}
