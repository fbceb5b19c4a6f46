//! Explicit self-ratings written into free text, e.g. "pain 7/10",
//! "stress level: 6", "fatigue - 4". Values are clamped to 1–10.

use regex::Regex;

use super::SymptomCategory;
use crate::error::{EngineError, Result};

/// Compiled rating patterns for every symptom category.
#[derive(Debug, Clone)]
pub struct RatingExtractor {
    patterns: Vec<(SymptomCategory, Vec<Regex>)>,
}

impl RatingExtractor {
    pub fn new() -> Result<Self> {
        let patterns = SymptomCategory::ALL
            .iter()
            .map(|c| Ok((*c, compile(c.as_str())?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// First explicit rating for `category`, trying the patterns in order.
    pub fn extract(&self, text: &str, category: SymptomCategory) -> Option<u8> {
        let (_, regexes) = self.patterns.iter().find(|(c, _)| *c == category)?;
        regexes.iter().find_map(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .map(|v| v.clamp(1, 10) as u8)
        })
    }
}

fn compile(metric: &str) -> Result<Vec<Regex>> {
    let m = regex::escape(metric);
    [
        format!(r"(?i)\b{m}\s*(?:level|score)\s*(?::|is|of)\s*(\d{{1,3}})\b"),
        format!(r"(?i)\b{m}:\s*(\d{{1,3}})\b"),
        format!(r"(?i)\b{m}\s*-\s*(\d{{1,3}})\b"),
        format!(r"(?i)\b{m}\b[^.\n]{{0,24}}?(\d{{1,3}})\s*/\s*10\b"),
    ]
    .iter()
    .map(|p| {
        Regex::new(p).map_err(|e| EngineError::config(format!("rating pattern `{p}`: {e}")))
    })
    .collect()
}
