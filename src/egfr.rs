//! Estimated glomerular filtration rate (CKD-EPI 2021, race-free) and the
//! KDIGO stage it falls into.
//!
//! Invalid inputs give `None` rather than an error, like the other
//! advisory calculations in this crate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Sex;

/// eGFR in mL/min/1.73m², rounded to two decimals.
pub fn calculate_egfr(
    age: Option<u32>,
    sex: Option<Sex>,
    serum_creatinine: Option<f64>,
) -> Option<f64> {
    let age = age.filter(|a| (1..=120).contains(a))?;
    let sex = sex?;
    let scr = serum_creatinine.filter(|c| c.is_finite() && *c > 0.0)?;

    let (kappa, alpha, sex_factor) = match sex {
        Sex::Female => (0.7, -0.241, 1.012),
        Sex::Male => (0.9, -0.302, 1.0),
    };
    let ratio = scr / kappa;
    let egfr = 142.0
        * ratio.min(1.0).powf(alpha)
        * ratio.max(1.0).powf(-1.200)
        * 0.9938f64.powi(age as i32)
        * sex_factor;
    let rounded = (egfr * 100.0).round() / 100.0;
    debug!(target: "engine", age, ?sex, egfr = rounded, "egfr computed");
    Some(rounded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CkdStage {
    G1,
    G2,
    G3a,
    G3b,
    G4,
    G5,
}

impl CkdStage {
    pub fn from_egfr(egfr: f64) -> Self {
        if egfr >= 90.0 {
            CkdStage::G1
        } else if egfr >= 60.0 {
            CkdStage::G2
        } else if egfr >= 45.0 {
            CkdStage::G3a
        } else if egfr >= 30.0 {
            CkdStage::G3b
        } else if egfr >= 15.0 {
            CkdStage::G4
        } else {
            CkdStage::G5
        }
    }

    /// Numeric stage 1–5, as carried by `Demographics::ckd_stage`.
    pub fn number(&self) -> u8 {
        match self {
            CkdStage::G1 => 1,
            CkdStage::G2 => 2,
            CkdStage::G3a | CkdStage::G3b => 3,
            CkdStage::G4 => 4,
            CkdStage::G5 => 5,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CkdStage::G1 => "Normal or high kidney function",
            CkdStage::G2 => "Mildly decreased kidney function",
            CkdStage::G3a => "Mildly to moderately decreased kidney function",
            CkdStage::G3b => "Moderately to severely decreased kidney function",
            CkdStage::G4 => "Severely decreased kidney function",
            CkdStage::G5 => "Kidney failure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EgfrInterpretation {
    pub egfr: f64,
    pub stage: CkdStage,
    pub stage_number: u8,
    pub description: &'static str,
}

pub fn interpret_egfr(egfr: f64) -> EgfrInterpretation {
    let stage = CkdStage::from_egfr(egfr);
    EgfrInterpretation {
        egfr,
        stage,
        stage_number: stage.number(),
        description: stage.description(),
    }
}
