//! Engine counters. The library only emits; the host process decides
//! whether a recorder/exporter is installed.

use metrics::describe_counter;

pub const KSLS_TOTAL: &str = "engine_ksls_total";
pub const KSLS_INSUFFICIENT_TOTAL: &str = "engine_ksls_insufficient_total";
pub const TREND_TOTAL: &str = "engine_trend_total";
pub const CORRELATION_TOTAL: &str = "engine_correlation_total";
pub const ESTIMATE_TOTAL: &str = "engine_estimate_total";
pub const SUGGEST_TOTAL: &str = "engine_suggest_total";

/// Register descriptions; call once after installing a recorder.
pub fn describe_engine_metrics() {
    describe_counter!(KSLS_TOTAL, "Composite scores computed, labelled by band.");
    describe_counter!(
        KSLS_INSUFFICIENT_TOTAL,
        "Composite scoring calls rejected for missing blood pressure or hydration."
    );
    describe_counter!(
        TREND_TOTAL,
        "Trend classifications, labelled by direction."
    );
    describe_counter!(
        CORRELATION_TOTAL,
        "Correlation detections, labelled by whether enough pairs were available."
    );
    describe_counter!(ESTIMATE_TOTAL, "Text symptom estimates, labelled by source.");
    describe_counter!(
        SUGGEST_TOTAL,
        "Recommendation trigger evaluations, labelled by outcome."
    );
}
