// src/config/mod.rs
//! Configuration surface injected into the engine at construction time.

pub mod engine;

pub use engine::{
    BandCutoffs, CorrelationConfig, EngineConfig, FactorWeights, NormalizationConfig,
    RecommendationThresholds, TrendConfig, DEFAULT_ENGINE_CONFIG_PATH, ENV_ENGINE_CONFIG_PATH,
};
