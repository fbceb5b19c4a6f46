//! # Recommendation Trigger
//! Decides whether a symptom estimate warrants prompting the user to run a
//! full composite scoring pass. Pure policy, no side effects.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RecommendationThresholds;
use crate::symptoms::{SymptomCategory, SymptomEstimate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggest: bool,
    pub message: Option<String>,
}

impl Suggestion {
    pub fn none() -> Self {
        Self {
            suggest: false,
            message: None,
        }
    }
}

pub fn should_suggest_full_scoring(
    thresholds: &RecommendationThresholds,
    estimate: &SymptomEstimate,
) -> Suggestion {
    let met: Vec<String> = [
        (SymptomCategory::Fatigue, thresholds.fatigue),
        (SymptomCategory::Stress, thresholds.stress),
        (SymptomCategory::Pain, thresholds.pain),
    ]
    .into_iter()
    .filter_map(|(cat, min)| {
        estimate
            .get(cat)
            .filter(|v| *v >= min)
            .map(|v| format!("{} {}/10 (threshold {})", cat.as_str(), v, min))
    })
    .collect();

    if met.is_empty() {
        return Suggestion::none();
    }
    debug!(target: "engine", met = met.len(), "full scoring suggested");
    Suggestion {
        suggest: true,
        message: Some(format!(
            "Your entry points to elevated symptoms: {}. Consider running a full kidney stress score check.",
            met.join(", ")
        )),
    }
}
