//! # Signal Engine
//! One value owning the configuration, the symptom lexicon and the compiled
//! rating patterns. Operations only read that state, so the engine is
//! `Send + Sync` and can be shared behind an `Arc`.
//!
//! The lexicon is either fixed at construction or a [`HotReloadLexicon`]
//! consulted on every text estimate.
//!
//! Each call bumps a counter from [`crate::metrics`]; nothing is recorded
//! unless the host installed a recorder.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::correlation::{self, CorrelationResult};
use crate::error::{EngineError, Result};
use crate::ksls::{self, KslsInput, KslsResult};
use crate::metrics::{
    CORRELATION_TOTAL, ESTIMATE_TOTAL, KSLS_INSUFFICIENT_TOTAL, KSLS_TOTAL, SUGGEST_TOTAL,
    TREND_TOTAL,
};
use crate::recommend::{self, Suggestion};
use crate::symptoms::{
    self, Emotion, HotReloadLexicon, RatingExtractor, SymptomCategory, SymptomEstimate,
    SymptomLexicon,
};
use crate::trend::{self, TrendResult};
use crate::types::{Demographics, MetricSample};

/// Where a symptom value used by [`SignalEngine::score_with_journal`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOrigin {
    /// Already present in the structured input.
    Provided,
    /// An explicit "pain 7/10"-style rating in the text.
    ExplicitRating,
    /// The lexicon estimate.
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomFill {
    pub category: SymptomCategory,
    pub value: u8,
    pub origin: FillOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalScore {
    pub result: KslsResult,
    pub estimate: SymptomEstimate,
    /// Symptom values that entered the score, in fatigue/pain/stress order.
    pub symptoms: Vec<SymptomFill>,
    pub suggestion: Suggestion,
}

/// Fixed lexicon, or one that follows its file on disk.
#[derive(Debug, Clone)]
enum LexiconHandle {
    Fixed(Arc<SymptomLexicon>),
    Hot(Arc<HotReloadLexicon>),
}

impl LexiconHandle {
    fn current(&self) -> Arc<SymptomLexicon> {
        match self {
            LexiconHandle::Fixed(l) => Arc::clone(l),
            LexiconHandle::Hot(h) => h.current(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: EngineConfig,
    lexicon: LexiconHandle,
    ratings: RatingExtractor,
}

impl SignalEngine {
    /// Validate both inputs and compile the rating patterns.
    pub fn new(config: EngineConfig, lexicon: SymptomLexicon) -> Result<Self> {
        Self::build(config, LexiconHandle::Fixed(Arc::new(lexicon)))
    }

    /// Like [`SignalEngine::new`], but every text estimate reads the latest
    /// lexicon from `lexicon`, so edits to its file apply without a rebuild.
    pub fn with_hot_lexicon(config: EngineConfig, lexicon: Arc<HotReloadLexicon>) -> Result<Self> {
        Self::build(config, LexiconHandle::Hot(lexicon))
    }

    fn build(config: EngineConfig, lexicon: LexiconHandle) -> Result<Self> {
        config.validate()?;
        let current = lexicon.current();
        current.validate()?;
        let ratings = RatingExtractor::new()?;
        info!(
            target: "engine",
            lexicon_version = current.version.as_deref().unwrap_or("unversioned"),
            hot_reload = matches!(lexicon, LexiconHandle::Hot(_)),
            "signal engine ready"
        );
        Ok(Self {
            config,
            lexicon,
            ratings,
        })
    }

    /// Built-in defaults and the bundled lexicon.
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default(), SymptomLexicon::builtin()?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Lexicon the next estimate will use.
    pub fn lexicon(&self) -> Arc<SymptomLexicon> {
        self.lexicon.current()
    }

    pub fn compute_ksls(
        &self,
        input: &KslsInput,
        demographics: Option<&Demographics>,
    ) -> Result<KslsResult> {
        match ksls::compute_ksls(&self.config, input, demographics) {
            Ok(r) => {
                counter!(KSLS_TOTAL, "band" => r.band.as_str()).increment(1);
                Ok(r)
            }
            Err(e) => {
                if matches!(e, EngineError::InsufficientInput { .. }) {
                    counter!(KSLS_INSUFFICIENT_TOTAL).increment(1);
                }
                Err(e)
            }
        }
    }

    pub fn analyze_trend(
        &self,
        history: &[MetricSample],
        metric_name: &str,
        max_window_days: Option<usize>,
    ) -> Result<TrendResult> {
        let r = trend::analyze_trend(&self.config.trend, history, metric_name, max_window_days)?;
        counter!(TREND_TOTAL, "direction" => r.direction.as_str()).increment(1);
        Ok(r)
    }

    pub fn detect_correlation(
        &self,
        series_a: &[MetricSample],
        series_b: &[MetricSample],
        invert_b: bool,
    ) -> CorrelationResult {
        let r = correlation::detect_correlation(&self.config.correlation, series_a, series_b, invert_b);
        let outcome = if r.pairs >= self.config.correlation.min_pairs {
            "computed"
        } else {
            "insufficient"
        };
        counter!(CORRELATION_TOTAL, "outcome" => outcome).increment(1);
        r
    }

    pub fn estimate_from_text(&self, text: &str, emotion: Option<Emotion>) -> SymptomEstimate {
        let lexicon = self.lexicon.current();
        let e = symptoms::estimate_from_text(&lexicon, text, emotion);
        counter!(ESTIMATE_TOTAL, "source" => e.source.as_str()).increment(1);
        e
    }

    pub fn should_suggest_full_scoring(&self, estimate: &SymptomEstimate) -> Suggestion {
        let s = recommend::should_suggest_full_scoring(&self.config.recommendation, estimate);
        let outcome = if s.suggest { "suggested" } else { "quiet" };
        counter!(SUGGEST_TOTAL, "outcome" => outcome).increment(1);
        s
    }

    /// First explicit self-rating in `text` for `category`.
    pub fn explicit_rating(&self, text: &str, category: SymptomCategory) -> Option<u8> {
        self.ratings.extract(text, category)
    }

    /// Score structured readings together with a journal entry.
    ///
    /// Unrated fatigue/pain/stress are filled from an explicit rating in the
    /// text, else from the lexicon estimate. Values already in `input` win.
    pub fn score_with_journal(
        &self,
        input: &KslsInput,
        demographics: Option<&Demographics>,
        text: &str,
        emotion: Option<Emotion>,
    ) -> Result<JournalScore> {
        let estimate = self.estimate_from_text(text, emotion);
        let mut merged = input.clone();
        let mut filled = Vec::new();

        for category in SymptomCategory::ALL {
            let slot = match category {
                SymptomCategory::Fatigue => &mut merged.fatigue,
                SymptomCategory::Pain => &mut merged.pain,
                SymptomCategory::Stress => &mut merged.stress,
            };
            let picked = match *slot {
                Some(v) => Some((v, FillOrigin::Provided)),
                None => self
                    .explicit_rating(text, category)
                    .map(|v| (v, FillOrigin::ExplicitRating))
                    .or_else(|| estimate.get(category).map(|v| (v, FillOrigin::Estimated))),
            };
            if let Some((value, origin)) = picked {
                *slot = Some(value);
                filled.push(SymptomFill {
                    category,
                    value,
                    origin,
                });
            }
        }

        debug!(
            target: "engine",
            filled = filled.iter().filter(|f| f.origin != FillOrigin::Provided).count(),
            "journal merged into scoring input"
        );

        let result = self.compute_ksls(&merged, demographics)?;
        let suggestion = self.should_suggest_full_scoring(&estimate);
        Ok(JournalScore {
            result,
            estimate,
            symptoms: filled,
            suggestion,
        })
    }
}
