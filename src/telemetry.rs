//! Metric events for inference runs.
//!
//! ## Metrics Exposed
//!
//! - `rule` - one event per completed rule, with update count and fixpoint stats
//! - `rule_failure` - one event per failed rule
//! - `run` - one event per orchestrated run
//!
//! Emitted through tracing under the `route_inference::metrics` target so they
//! can be aggregated from logs.

use tracing::{info, warn};

use crate::error::InferenceError;
use crate::types::{InferenceReport, RuleName, RuleOutcome};

/// Record a completed rule.
pub fn record_rule_metrics(outcome: &RuleOutcome) {
    let (iterations, derived) = outcome
        .fixpoint
        .map(|f| (f.iterations, f.derived()))
        .unwrap_or((0, 0));

    info!(
        target: "route_inference::metrics",
        metric_type = "rule",
        rule = %outcome.rule,
        updates_applied = outcome.updates_applied,
        iterations = iterations,
        derived = derived,
        latency_ms = outcome.elapsed_ms,
        "rule_metric"
    );
}

/// Record a failed rule.
pub fn record_rule_failure(rule: RuleName, error: &InferenceError) {
    warn!(
        target: "route_inference::metrics",
        metric_type = "rule_failure",
        rule = %rule,
        error = %error,
        "rule_failure_metric"
    );
}

/// Record a finished run.
pub fn record_run_metrics(report: &InferenceReport) {
    info!(
        target: "route_inference::metrics",
        metric_type = "run",
        run_id = %report.run_id,
        completed = report.outcomes.len(),
        failed = report.failures.len(),
        latency_ms = report.elapsed_ms,
        "run_metric"
    );
}
