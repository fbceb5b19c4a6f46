// src/symptoms/mod.rs
//! Text-derived symptom estimates: lexicon, estimator and explicit-rating
//! extraction for journal/chat entries.

pub mod estimator;
pub mod lexicon;
pub mod ratings;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use estimator::{estimate_from_text, Confidence, EstimateSource, SymptomEstimate, Triggers};
pub use lexicon::{EmotionBaseline, HotReloadLexicon, SymptomLexicon, TierPhrases};
pub use ratings::RatingExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomCategory {
    Fatigue,
    Pain,
    Stress,
}

impl SymptomCategory {
    pub const ALL: [SymptomCategory; 3] = [Self::Fatigue, Self::Pain, Self::Stress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fatigue => "fatigue",
            Self::Pain => "pain",
            Self::Stress => "stress",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Highest first.
    pub const ALL: [Severity; 3] = [Self::Severe, Self::Moderate, Self::Mild];
}

/// Coarse emotion tag picked by the user next to a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Calm,
    Stressed,
    Tired,
    Worried,
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "calm" => Ok(Self::Calm),
            "stressed" => Ok(Self::Stressed),
            "tired" => Ok(Self::Tired),
            "worried" => Ok(Self::Worried),
            other => Err(format!("unknown emotion tag `{other}`")),
        }
    }
}

/// Lowercase, typographic apostrophes folded, whitespace collapsed.
pub(crate) fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        let ch = match ch {
            '\u{2019}' | '\u{2018}' => '\'',
            c => c,
        };
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            last_space = false;
        }
    }
    out.trim().to_string()
}

/// Short anonymized id for logs; journal text itself is never logged.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_space_and_apostrophes() {
        assert_eq!(
            normalize_text("  Can\u{2019}t   GET\tout of bed "),
            "can't get out of bed"
        );
    }

    #[test]
    fn emotion_from_str() {
        assert_eq!("Tired".parse::<Emotion>(), Ok(Emotion::Tired));
        assert!("angry".parse::<Emotion>().is_err());
    }

    #[test]
    fn anon_hash_is_stable_and_short() {
        let a = anon_hash("my journal");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("my journal"));
        assert_ne!(a, anon_hash("my journal!"));
    }
}
