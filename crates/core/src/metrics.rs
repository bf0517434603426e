//! Prometheus metrics for the orchestrator.
//!
//! This module provides metrics for:
//! - Pipeline runs (starts, outcomes)
//! - Acquisition (attempts by method and result)
//! - Flat-fielding (probe exposures, convergence iterations)
//! - Safety (weather classifications)
//! - Scheduler (claim results)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Pipeline runs started total.
pub static PIPELINE_RUNS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("auriga_pipeline_runs_total", "Total pipeline runs started").unwrap()
});

/// Run outcomes total by terminal state.
pub static RUN_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("auriga_run_outcomes_total", "Total terminal run outcomes"),
        &["outcome"], // "completed", "aborted", "failed"
    )
    .unwrap()
});

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Acquisition attempts total by variant and result.
pub static ACQUISITION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "auriga_acquisition_attempts_total",
            "Total acquisition attempts",
        ),
        &["method", "result"], // result: "success", "no_solution", "hardware_error"
    )
    .unwrap()
});

// =============================================================================
// Flat-Fielding Metrics
// =============================================================================

/// Flat probe exposures taken total.
pub static FLAT_PROBE_EXPOSURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "auriga_flat_probe_exposures_total",
        "Total flat-field probe exposures taken",
    )
    .unwrap()
});

/// Iterations needed for flat-field convergence.
pub static FLAT_ITERATIONS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "auriga_flat_iterations",
            "Iterations until flat-field convergence",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 7.0, 10.0]),
    )
    .unwrap()
});

// =============================================================================
// Safety Metrics
// =============================================================================

/// Weather sample classifications total.
pub static WEATHER_CLASSIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "auriga_weather_classifications_total",
            "Total weather sample classifications",
        ),
        &["class"], // "safe", "unsafe", "stale"
    )
    .unwrap()
});

// =============================================================================
// Scheduler Metrics
// =============================================================================

/// Claim attempts total by result.
pub static SCHEDULER_CLAIMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("auriga_scheduler_claims_total", "Total claim attempts"),
        &["result"], // "granted", "conflict"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Pipeline
        Box::new(PIPELINE_RUNS.clone()),
        Box::new(RUN_OUTCOMES.clone()),
        // Acquisition
        Box::new(ACQUISITION_ATTEMPTS.clone()),
        // Flat-fielding
        Box::new(FLAT_PROBE_EXPOSURES.clone()),
        Box::new(FLAT_ITERATIONS.clone()),
        // Safety
        Box::new(WEATHER_CLASSIFICATIONS.clone()),
        // Scheduler
        Box::new(SCHEDULER_CLAIMS.clone()),
    ]
}
