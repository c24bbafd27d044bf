//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Dispatcher (submissions, finished sessions)
//! - Pipeline stages (durations, results, artifact failures)
//! - Publisher and LLM usage

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sessions
// =============================================================================

/// Sessions accepted by the dispatcher.
pub static SESSIONS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "edapt_sessions_submitted_total",
        "Total generation sessions submitted",
    )
    .unwrap()
});

/// Sessions that reached a terminal status.
pub static SESSIONS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "edapt_sessions_finished_total",
            "Total sessions reaching a terminal status",
        ),
        &["status"], // "completed", "failed"
    )
    .unwrap()
});

// =============================================================================
// Pipeline stages
// =============================================================================

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "edapt_stage_duration_seconds",
            "Duration of pipeline stage adapter calls",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["stage", "result"],
    )
    .unwrap()
});

/// Stage outcomes.
pub static STAGE_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("edapt_stage_results_total", "Pipeline stage outcomes"),
        &["stage", "result"], // stage: "generation", "synthesis", "render", "mux"
    )
    .unwrap()
});

/// Artifacts recorded as failed on an otherwise completed session.
pub static ARTIFACT_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "edapt_artifact_failures_total",
            "Artifacts that failed without failing the session",
        ),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Publisher
// =============================================================================

pub static PUBLISH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("edapt_publish_total", "Publish attempts by result"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// External services
// =============================================================================

/// LLM tokens used.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("edapt_llm_tokens_total", "Total LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Records one stage call in both the histogram and the counter.
pub fn record_stage(stage: &str, result: &str, duration_secs: f64) {
    STAGE_DURATION
        .with_label_values(&[stage, result])
        .observe(duration_secs);
    STAGE_RESULTS.with_label_values(&[stage, result]).inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sessions
        Box::new(SESSIONS_SUBMITTED.clone()),
        Box::new(SESSIONS_FINISHED.clone()),
        // Stages
        Box::new(STAGE_DURATION.clone()),
        Box::new(STAGE_RESULTS.clone()),
        Box::new(ARTIFACT_FAILURES.clone()),
        // Publisher
        Box::new(PUBLISH_TOTAL.clone()),
        // External services
        Box::new(LLM_TOKENS.clone()),
    ]
}
