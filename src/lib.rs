// src/lib.rs
// Public library surface for the CLI and integration tests.

pub mod config;
pub mod correlation;
pub mod egfr;
pub mod engine;
pub mod error;
pub mod ksls;
pub mod metrics;
pub mod normalize;
pub mod recommend;
pub mod symptoms;
pub mod trend;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::config::EngineConfig;
pub use crate::correlation::{align_by_day, CorrelationResult};
pub use crate::egfr::{calculate_egfr, interpret_egfr, CkdStage, EgfrInterpretation};
pub use crate::engine::{FillOrigin, JournalScore, SignalEngine, SymptomFill};
pub use crate::error::{EngineError, Result};
pub use crate::ksls::{KslsFactors, KslsInput, KslsResult, RiskBand};
pub use crate::normalize::{normalize, Polarity};
pub use crate::recommend::Suggestion;
pub use crate::symptoms::{
    Confidence, Emotion, EstimateSource, HotReloadLexicon, SymptomCategory, SymptomEstimate,
    SymptomLexicon,
};
pub use crate::trend::{TrendDirection, TrendResult};
pub use crate::types::{Demographics, MetricSample, Sex};
