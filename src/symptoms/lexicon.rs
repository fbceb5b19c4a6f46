//! Severity-graded symptom lexicon with hot-reload from a JSON file.
//!
//! JSON shape:
//! {
//!   "version": "2025.06",
//!   "fatigue": { "mild": [..], "moderate": [..], "severe": [..] },
//!   "pain":    { ... },
//!   "stress":  { ... },
//!   "emotions": { "tired": { "fatigue": 6, "stress": 3 }, ... }
//! }
//!
//! Phrases are stored lowercased with collapsed whitespace, the same form
//! the estimator matches against.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::SystemTime,
};
use tracing::{info, warn};

use super::{normalize_text, Emotion, Severity, SymptomCategory};
use crate::error::{EngineError, Result};

const BUILTIN_LEXICON: &str = include_str!("../../config/symptom_lexicon.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierPhrases {
    #[serde(default)]
    pub mild: Vec<String>,
    #[serde(default)]
    pub moderate: Vec<String>,
    #[serde(default)]
    pub severe: Vec<String>,
}

impl TierPhrases {
    pub fn tier(&self, severity: Severity) -> &[String] {
        match severity {
            Severity::Mild => &self.mild,
            Severity::Moderate => &self.moderate,
            Severity::Severe => &self.severe,
        }
    }

    fn normalized(self) -> Self {
        let clean = |v: Vec<String>| v.iter().map(|p| normalize_text(p)).collect();
        Self {
            mild: clean(self.mild),
            moderate: clean(self.moderate),
            severe: clean(self.severe),
        }
    }
}

/// 0–10 baselines an emotion tag contributes. Emotions never carry pain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionBaseline {
    #[serde(default)]
    pub fatigue: Option<u8>,
    #[serde(default)]
    pub stress: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomLexicon {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub fatigue: TierPhrases,
    #[serde(default)]
    pub pain: TierPhrases,
    #[serde(default)]
    pub stress: TierPhrases,
    #[serde(default)]
    pub emotions: BTreeMap<Emotion, EmotionBaseline>,
}

impl SymptomLexicon {
    /// The lexicon shipped in `config/symptom_lexicon.json`.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_LEXICON)
    }

    /// Parse, normalize and validate a lexicon document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: SymptomLexicon = serde_json::from_str(json)
            .map_err(|e| EngineError::config(format!("symptom lexicon JSON: {e}")))?;
        let lex = Self {
            version: raw.version,
            fatigue: raw.fatigue.normalized(),
            pain: raw.pain.normalized(),
            stress: raw.stress.normalized(),
            emotions: raw.emotions,
        };
        lex.validate()?;
        Ok(lex)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading symptom lexicon from {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("loading symptom lexicon from {}", path.display()))
    }

    pub fn phrases(&self, category: SymptomCategory) -> &TierPhrases {
        match category {
            SymptomCategory::Fatigue => &self.fatigue,
            SymptomCategory::Pain => &self.pain,
            SymptomCategory::Stress => &self.stress,
        }
    }

    pub fn emotion_baseline(&self, emotion: Emotion) -> EmotionBaseline {
        self.emotions.get(&emotion).copied().unwrap_or_default()
    }

    /// Empty phrases would match every text; baselines must stay on the 0–10 scale.
    pub fn validate(&self) -> Result<()> {
        for category in SymptomCategory::ALL {
            for severity in Severity::ALL {
                if self
                    .phrases(category)
                    .tier(severity)
                    .iter()
                    .any(|p| p.is_empty())
                {
                    return Err(EngineError::config(format!(
                        "symptom lexicon: empty phrase in {category:?}/{severity:?}"
                    )));
                }
            }
        }
        for (emotion, b) in &self.emotions {
            if b.fatigue.is_some_and(|v| v > 10) || b.stress.is_some_and(|v| v > 10) {
                return Err(EngineError::config(format!(
                    "symptom lexicon: baseline for {emotion:?} is outside 0..=10"
                )));
            }
        }
        Ok(())
    }
}

/// Hot-reload wrapper: reloads when the lexicon file mtime changes.
/// Owned by the caller; a failed reload keeps the previous lexicon.
#[derive(Debug)]
pub struct HotReloadLexicon {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    lexicon: Arc<SymptomLexicon>,
    last_modified: Option<SystemTime>,
}

impl HotReloadLexicon {
    pub fn new(path: impl Into<PathBuf>, initial: SymptomLexicon) -> Self {
        Self {
            path: path.into(),
            inner: RwLock::new(State {
                lexicon: Arc::new(initial),
                last_modified: None,
            }),
        }
    }

    /// Latest lexicon, reloading first if the file changed on disk.
    pub fn current(&self) -> Arc<SymptomLexicon> {
        let mtime = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(m) => m,
            // File isn't there: keep what we have.
            Err(_) => return self.read_state().lexicon.clone(),
        };

        {
            let guard = self.read_state();
            if guard.last_modified == Some(mtime) {
                return guard.lexicon.clone();
            }
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Double-check in case another reader reloaded meanwhile.
        if guard.last_modified != Some(mtime) {
            match SymptomLexicon::load_from_file(&self.path) {
                Ok(lex) => {
                    info!(
                        target: "engine",
                        path = %self.path.display(),
                        version = ?lex.version,
                        "symptom lexicon reloaded"
                    );
                    guard.lexicon = Arc::new(lex);
                }
                Err(e) => {
                    warn!(target: "engine", "symptom lexicon reload failed: {e:#}");
                }
            }
            // Remember the mtime either way so a broken file isn't re-parsed on every call.
            guard.last_modified = Some(mtime);
        }
        guard.lexicon.clone()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, thread, time::Duration};

    /// Create a unique temporary directory in std::env::temp_dir().
    fn unique_tmp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        dir.push(format!("lexicon_test_{}", nanos));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn builtin_lexicon_parses() {
        let lex = SymptomLexicon::builtin().unwrap();
        assert!(lex.fatigue.severe.contains(&"exhausted".to_string()));
        assert_eq!(
            lex.emotion_baseline(Emotion::Tired),
            EmotionBaseline {
                fatigue: Some(6),
                stress: Some(3)
            }
        );
    }

    #[test]
    fn phrases_are_normalized_on_load() {
        let lex = SymptomLexicon::from_json_str(r#"{"pain":{"severe":["  Sharp   PAIN "]}}"#)
            .unwrap();
        assert_eq!(lex.pain.severe, vec!["sharp pain"]);
        assert!(lex.emotions.is_empty());
    }

    #[test]
    fn empty_phrase_is_rejected() {
        let err = SymptomLexicon::from_json_str(r#"{"stress":{"mild":["   "]}}"#).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn out_of_scale_baseline_is_rejected() {
        let err =
            SymptomLexicon::from_json_str(r#"{"emotions":{"calm":{"stress":11}}}"#).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn loads_and_hot_reloads() {
        let tmpdir = unique_tmp_dir();
        let path = tmpdir.join("lexicon.json");

        {
            let mut f = fs::File::create(&path).unwrap();
            write!(f, r#"{{"version":"v1","pain":{{"mild":["twinge"]}}}}"#).unwrap();
            f.sync_all().unwrap();
        }

        let hot = HotReloadLexicon::new(&path, SymptomLexicon::default());
        let l1 = hot.current();
        assert_eq!(l1.version.as_deref(), Some("v1"));

        // Ensure different mtime (coarse filesystem granularity).
        thread::sleep(Duration::from_millis(1100));

        {
            let mut f = fs::File::create(&path).unwrap();
            write!(f, r#"{{"version":"v2","pain":{{"mild":["twinge","sore"]}}}}"#).unwrap();
            f.sync_all().unwrap();
        }
        let l2 = hot.current();
        assert_eq!(l2.version.as_deref(), Some("v2"));
        assert_eq!(l2.pain.mild.len(), 2);

        thread::sleep(Duration::from_millis(1100));
        {
            let mut f = fs::File::create(&path).unwrap();
            write!(f, "not json").unwrap();
            f.sync_all().unwrap();
        }
        // Broken file keeps the last good lexicon.
        assert_eq!(hot.current().version.as_deref(), Some("v2"));

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&tmpdir);
    }
}
