// tests/text_estimates.rs
//! Journal text → symptom estimate → recommendation, against the bundled
//! lexicon and through the engine facade.

use health_signal_engine::symptoms::Triggers;
use health_signal_engine::{
    Confidence, Emotion, EstimateSource, FillOrigin, KslsInput, SignalEngine, SymptomCategory,
    SymptomEstimate, SymptomLexicon,
};

fn engine() -> SignalEngine {
    SignalEngine::with_defaults().expect("default engine should build")
}

fn estimate(fatigue: Option<u8>, pain: Option<u8>, stress: Option<u8>) -> SymptomEstimate {
    SymptomEstimate {
        fatigue,
        pain,
        stress,
        confidence: Confidence::Moderate,
        triggers: Triggers::default(),
        source: EstimateSource::Keywords,
    }
}

#[test]
fn exhausted_flank_pain_entry_round_trip() {
    let e = engine();
    let est = e.estimate_from_text(
        "I'm feeling exhausted today, can't get out of bed, and have some flank pain",
        Some(Emotion::Tired),
    );

    let fatigue = est.fatigue.expect("fatigue detected");
    assert!(fatigue >= 8, "fatigue {fatigue}");
    let pain = est.pain.expect("pain detected");
    assert!((5..=7).contains(&pain), "pain {pain}");
    assert_eq!(est.stress, None);
    assert_eq!(est.confidence, Confidence::High);
    assert_eq!(est.source, EstimateSource::Hybrid);
    assert_eq!(
        est.triggers.fatigue,
        vec!["exhausted".to_string(), "can't get out of bed".to_string()]
    );
    assert_eq!(est.triggers.pain, vec!["flank pain".to_string()]);
}

#[test]
fn curly_apostrophes_match_lexicon_phrases() {
    let e = engine();
    let est = e.estimate_from_text("Honestly I can\u{2019}t get out of bed", None);
    assert_eq!(est.fatigue, Some(8));
    assert_eq!(est.source, EstimateSource::Keywords);
}

#[test]
fn emotion_tag_alone_gives_low_confidence_baselines() {
    let e = engine();
    let est = e.estimate_from_text("", Some(Emotion::Worried));
    assert_eq!(est.fatigue, Some(3));
    assert_eq!(est.stress, Some(6));
    assert_eq!(est.pain, None);
    assert_eq!(est.confidence, Confidence::Low);
    assert_eq!(est.source, EstimateSource::EmotionIcon);
}

#[test]
fn pain_only_entry_keeps_the_emotion_tag() {
    let e = engine();
    let est = e.estimate_from_text("my back is a bit sore", Some(Emotion::Stressed));
    assert_eq!(est.pain, Some(3));
    assert_eq!(est.fatigue, Some(4));
    assert_eq!(est.stress, Some(7));
    assert_eq!(est.confidence, Confidence::Moderate);
    assert_eq!(est.source, EstimateSource::Hybrid);
}

#[test]
fn pain_three_alone_triggers_suggestion() {
    let e = engine();
    let s = e.should_suggest_full_scoring(&estimate(None, Some(3), None));
    assert!(s.suggest);
    let msg = s.message.expect("message when suggesting");
    assert!(msg.contains("pain 3/10"), "{msg}");
}

#[test]
fn below_all_thresholds_stays_quiet() {
    let e = engine();
    let s = e.should_suggest_full_scoring(&estimate(Some(4), Some(2), Some(4)));
    assert!(!s.suggest);
    assert_eq!(s.message, None);
}

#[test]
fn message_lists_every_threshold_met() {
    let e = engine();
    let s = e.should_suggest_full_scoring(&estimate(Some(9), Some(1), Some(5)));
    let msg = s.message.unwrap();
    assert!(msg.contains("fatigue 9/10"));
    assert!(msg.contains("stress 5/10"));
    assert!(!msg.contains("pain"));
}

#[test]
fn custom_lexicon_extends_detection() {
    let lex = SymptomLexicon::from_json_str(
        r#"{
            "version": "test",
            "fatigue": { "moderate": ["running on empty"] },
            "pain": {},
            "stress": { "severe": ["at my wits end"] }
        }"#,
    )
    .unwrap();
    let e = SignalEngine::new(Default::default(), lex).unwrap();
    let est = e.estimate_from_text("Running on empty and at my wits end", None);
    assert_eq!(est.fatigue, Some(5));
    assert_eq!(est.stress, Some(8));
    // the bundled phrases are not part of this lexicon
    assert_eq!(e.estimate_from_text("exhausted", None).fatigue, None);
}

#[test]
fn explicit_rating_beats_estimate_when_scoring_journal() {
    let e = engine();
    let readings = KslsInput {
        systolic_bp: Some(125.0),
        diastolic_bp: Some(82.0),
        fluid_intake_liters: Some(1.8),
        fluid_target_liters: Some(2.0),
        ..Default::default()
    };
    let out = e
        .score_with_journal(&readings, None, "Back pain 7/10 and feeling anxious", None)
        .unwrap();

    let pain = out
        .symptoms
        .iter()
        .find(|f| f.category == SymptomCategory::Pain)
        .unwrap();
    assert_eq!(pain.value, 7);
    assert_eq!(pain.origin, FillOrigin::ExplicitRating);
    // "back pain" alone would estimate 5
    assert_eq!(out.estimate.pain, Some(5));

    let stress = out
        .symptoms
        .iter()
        .find(|f| f.category == SymptomCategory::Stress)
        .unwrap();
    assert_eq!(stress.value, 5);
    assert_eq!(stress.origin, FillOrigin::Estimated);
    assert!(out.suggestion.suggest);
}
