//! # Text Symptom Estimator
//! Free text (+ optional emotion tag) → 0–10 fatigue/pain/stress estimates.
//!
//! Policy:
//! - Every lexicon phrase is matched as a case-insensitive substring.
//! - A category scores from its highest detected tier and its total number
//!   of matched phrases (severe 8/9/10, moderate 5/6/7, mild 3/4).
//! - Fatigue and stress blend keyword and emotion scores 70/30 when both
//!   exist. Emotion alone only fills fatigue or stress when the text named
//!   neither of them; otherwise it just colours what the words already say.
//! - Pain is keyword-only and never affects the emotion fill.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lexicon::SymptomLexicon;
use super::{anon_hash, normalize_text, Emotion, Severity, SymptomCategory};

const KEYWORD_SHARE: f64 = 0.7;
const EMOTION_SHARE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    EmotionIcon,
    Keywords,
    Hybrid,
}

impl EstimateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateSource::EmotionIcon => "emotion_icon",
            EstimateSource::Keywords => "keywords",
            EstimateSource::Hybrid => "hybrid",
        }
    }
}

/// Matched phrases per category, highest tier first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triggers {
    pub fatigue: Vec<String>,
    pub pain: Vec<String>,
    pub stress: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomEstimate {
    pub fatigue: Option<u8>,
    pub pain: Option<u8>,
    pub stress: Option<u8>,
    pub confidence: Confidence,
    pub triggers: Triggers,
    pub source: EstimateSource,
}

impl SymptomEstimate {
    pub fn get(&self, category: SymptomCategory) -> Option<u8> {
        match category {
            SymptomCategory::Fatigue => self.fatigue,
            SymptomCategory::Pain => self.pain,
            SymptomCategory::Stress => self.stress,
        }
    }
}

/// Matches found for one category.
#[derive(Debug, Default)]
struct Detection {
    highest: Option<Severity>,
    phrases: Vec<String>,
}

fn detect(text: &str, lexicon: &SymptomLexicon, category: SymptomCategory) -> Detection {
    let tiers = lexicon.phrases(category);
    let mut det = Detection::default();
    for severity in Severity::ALL {
        for phrase in tiers.tier(severity) {
            if text.contains(phrase.as_str()) && !det.phrases.contains(phrase) {
                det.highest = Some(det.highest.map_or(severity, |h| h.max(severity)));
                det.phrases.push(phrase.clone());
            }
        }
    }
    det
}

/// Tier score from the highest tier and the total match count.
fn tier_score(highest: Severity, matches: usize) -> u8 {
    match highest {
        Severity::Severe => match matches {
            0 | 1 => 8,
            2 => 9,
            _ => 10,
        },
        Severity::Moderate => match matches {
            0 | 1 => 5,
            2 => 6,
            _ => 7,
        },
        Severity::Mild => {
            if matches >= 2 {
                4
            } else {
                3
            }
        }
    }
}

/// One field's combined value and how it was obtained.
fn combine(
    keyword: Option<u8>,
    emotion: Option<u8>,
    mood_words_found: bool,
) -> Option<(u8, Confidence, EstimateSource)> {
    match (keyword, emotion) {
        (Some(k), Some(e)) => {
            let blended = (f64::from(k) * KEYWORD_SHARE + f64::from(e) * EMOTION_SHARE).round();
            Some((
                blended.clamp(0.0, 10.0) as u8,
                Confidence::High,
                EstimateSource::Hybrid,
            ))
        }
        (Some(k), None) => Some((k, Confidence::Moderate, EstimateSource::Keywords)),
        (None, Some(e)) if !mood_words_found => {
            Some((e.min(10), Confidence::Low, EstimateSource::EmotionIcon))
        }
        _ => None,
    }
}

/// Estimate symptom severities from one text entry.
pub fn estimate_from_text(
    lexicon: &SymptomLexicon,
    text: &str,
    emotion: Option<Emotion>,
) -> SymptomEstimate {
    let normalized = normalize_text(text);
    let fatigue_det = detect(&normalized, lexicon, SymptomCategory::Fatigue);
    let pain_det = detect(&normalized, lexicon, SymptomCategory::Pain);
    let stress_det = detect(&normalized, lexicon, SymptomCategory::Stress);

    let keyword_score = |d: &Detection| d.highest.map(|h| tier_score(h, d.phrases.len()));
    let mood_words_found = fatigue_det.highest.is_some() || stress_det.highest.is_some();

    let baseline = emotion
        .map(|e| lexicon.emotion_baseline(e))
        .unwrap_or_default();

    let fatigue = combine(keyword_score(&fatigue_det), baseline.fatigue, mood_words_found);
    let stress = combine(keyword_score(&stress_det), baseline.stress, mood_words_found);
    let pain = keyword_score(&pain_det).map(|p| (p, Confidence::Moderate, EstimateSource::Keywords));

    let fields = [fatigue, pain, stress];
    let confidence = fields
        .iter()
        .flatten()
        .map(|(_, c, _)| *c)
        .max()
        .unwrap_or(Confidence::Low);

    let has = |src: EstimateSource| fields.iter().flatten().any(|(_, _, s)| *s == src);
    let source = if has(EstimateSource::Hybrid)
        || (has(EstimateSource::Keywords) && has(EstimateSource::EmotionIcon))
    {
        EstimateSource::Hybrid
    } else if has(EstimateSource::EmotionIcon) {
        EstimateSource::EmotionIcon
    } else {
        EstimateSource::Keywords
    };

    let estimate = SymptomEstimate {
        fatigue: fatigue.map(|(v, _, _)| v),
        pain: pain.map(|(v, _, _)| v),
        stress: stress.map(|(v, _, _)| v),
        confidence,
        triggers: Triggers {
            fatigue: fatigue_det.phrases,
            pain: pain_det.phrases,
            stress: stress_det.phrases,
        },
        source,
    };

    debug!(
        target: "engine",
        id = %anon_hash(text),
        ?emotion,
        fatigue = ?estimate.fatigue,
        pain = ?estimate.pain,
        stress = ?estimate.stress,
        ?confidence,
        ?source,
        "symptom estimate"
    );
    estimate
}
