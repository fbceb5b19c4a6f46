//! Health Signal Engine CLI entrypoint.
//! Reads one JSON request, runs the matching engine operation and prints the
//! JSON result on stdout. Logs go to stderr.
//!
//! Usage: `health-signal-engine <command> <request.json | ->`

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use health_signal_engine::metrics::describe_engine_metrics;
use health_signal_engine::{
    align_by_day, calculate_egfr, interpret_egfr, Demographics, EgfrInterpretation, Emotion,
    EngineConfig, KslsInput, MetricSample, Sex, SignalEngine, Suggestion, SymptomEstimate,
    SymptomLexicon,
};

/// Optional override for the bundled symptom lexicon.
const ENV_LEXICON_PATH: &str = "HEALTH_ENGINE_LEXICON_PATH";

const USAGE: &str = "usage: health-signal-engine <ksls|journal|trend|correlate|estimate|egfr> <request.json | ->";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("engine=info,health_signal_engine=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[derive(Debug, Deserialize)]
struct KslsRequest {
    input: KslsInput,
    #[serde(default)]
    demographics: Option<Demographics>,
}

#[derive(Debug, Deserialize)]
struct JournalRequest {
    #[serde(default)]
    input: KslsInput,
    #[serde(default)]
    demographics: Option<Demographics>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    emotion: Option<Emotion>,
}

#[derive(Debug, Deserialize)]
struct TrendRequest {
    metric_name: String,
    history: Vec<MetricSample>,
    #[serde(default)]
    max_window_days: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CorrelateRequest {
    series_a: Vec<MetricSample>,
    series_b: Vec<MetricSample>,
    #[serde(default)]
    invert_b: bool,
    /// Average both series per UTC day before pairing.
    #[serde(default)]
    align_by_day: bool,
}

#[derive(Debug, Deserialize)]
struct EstimateRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    emotion: Option<Emotion>,
}

#[derive(Debug, Serialize)]
struct EstimateResponse {
    estimate: SymptomEstimate,
    suggestion: Suggestion,
}

#[derive(Debug, Deserialize)]
struct EgfrRequest {
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    serum_creatinine: Option<f64>,
}

#[derive(Debug, Serialize)]
struct EgfrResponse {
    egfr: Option<f64>,
    interpretation: Option<EgfrInterpretation>,
}

fn read_request<T: DeserializeOwned>(source: &str) -> anyhow::Result<T> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading request from {source}"))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parsing request JSON from {source}"))
}

fn build_engine() -> anyhow::Result<SignalEngine> {
    let config = EngineConfig::load_default()?;
    let lexicon = match std::env::var(ENV_LEXICON_PATH) {
        Ok(p) => SymptomLexicon::load_from_file(PathBuf::from(p))?,
        Err(_) => SymptomLexicon::builtin()?,
    };
    Ok(SignalEngine::new(config, lexicon)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(command: &str, source: &str) -> anyhow::Result<()> {
    // eGFR needs no configuration.
    if command == "egfr" {
        let req: EgfrRequest = read_request(source)?;
        let sex = req.sex.as_deref().and_then(Sex::parse);
        let egfr = calculate_egfr(req.age, sex, req.serum_creatinine);
        return print_json(&EgfrResponse {
            egfr,
            interpretation: egfr.map(interpret_egfr),
        });
    }

    let engine = build_engine()?;
    match command {
        "ksls" => {
            let req: KslsRequest = read_request(source)?;
            print_json(&engine.compute_ksls(&req.input, req.demographics.as_ref())?)
        }
        "journal" => {
            let req: JournalRequest = read_request(source)?;
            print_json(&engine.score_with_journal(
                &req.input,
                req.demographics.as_ref(),
                &req.text,
                req.emotion,
            )?)
        }
        "trend" => {
            let req: TrendRequest = read_request(source)?;
            print_json(&engine.analyze_trend(&req.history, &req.metric_name, req.max_window_days)?)
        }
        "correlate" => {
            let req: CorrelateRequest = read_request(source)?;
            let (a, b) = if req.align_by_day {
                align_by_day(&req.series_a, &req.series_b)
            } else {
                (req.series_a, req.series_b)
            };
            print_json(&engine.detect_correlation(&a, &b, req.invert_b))
        }
        "estimate" => {
            let req: EstimateRequest = read_request(source)?;
            let estimate = engine.estimate_from_text(&req.text, req.emotion);
            let suggestion = engine.should_suggest_full_scoring(&estimate);
            print_json(&EstimateResponse {
                estimate,
                suggestion,
            })
        }
        other => bail!("unknown command `{other}`\n{USAGE}"),
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; missing file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();
    describe_engine_metrics();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(command), Some(source)) = (args.first(), args.get(1)) else {
        bail!("{USAGE}");
    };
    info!(command = %command, "running");
    run(command, source)
}
