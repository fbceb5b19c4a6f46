//! Engine error taxonomy.
//!
//! Hard errors are composite scoring without its mandatory factors, readings
//! outside their scale, and invalid configuration. Sparse histories are not
//! errors; the analyzers return neutral results instead.

use thiserror::Error;

/// Errors surfaced by the inference engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Composite scoring invoked without blood pressure and/or hydration.
    #[error("insufficient input for composite scoring: missing {}", .missing.join(", "))]
    InsufficientInput { missing: Vec<&'static str> },

    /// A supplied reading is outside its scale (ratings 0–10, CKD stage 1–5).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Degenerate bounds, unknown metric name, bad weights or lexicon.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
