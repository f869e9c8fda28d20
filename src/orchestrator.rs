//! Rule orchestration.
//!
//! ```text
//! seed-difficulty ──► difficulty
//! duration
//! belongs-to ──► belongs-to-place ──► belongs-to-restaurant
//! ```
//!
//! seed-difficulty runs first and is awaited. Every other rule is then spawned
//! as its own task; dependents wait on the memoized results held by the
//! [`RuleSet`], so independent chains run concurrently against the store.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::rules::RuleSet;
use crate::store::GraphStore;
use crate::telemetry::{record_rule_failure, record_rule_metrics, record_run_metrics};
use crate::types::{InferenceReport, RuleName, RuleOutcome};

/// Runs the whole rule set against a store.
pub struct Orchestrator<S: GraphStore + 'static> {
    store: Arc<S>,
    config: InferenceConfig,
}

impl<S: GraphStore + 'static> Orchestrator<S> {
    /// Create an orchestrator over a store.
    pub fn new(store: Arc<S>, config: InferenceConfig) -> Self {
        Self { store, config }
    }

    /// Create an orchestrator configured from environment variables.
    pub fn from_env(store: Arc<S>) -> Self {
        Self::new(store, InferenceConfig::from_env())
    }

    /// Run every rule once, respecting dependencies.
    ///
    /// Returns `Err` only when seed-difficulty fails, in which case nothing else
    /// is launched. Failures of later rules are collected in the report; they
    /// do not stop unrelated rules.
    pub async fn run(&self) -> Result<InferenceReport, InferenceError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("inference_run", run_id = %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<InferenceReport, InferenceError> {
        let start = Instant::now();
        let mut report = InferenceReport::new(run_id);
        // Fresh memoization per run.
        let rules = Arc::new(RuleSet::new(Arc::clone(&self.store), self.config.clone()));

        info!("Seeding difficulty");
        let seed = match rules.seed_difficulty().await {
            Ok(seed) => seed,
            Err(e) => {
                error!(error = %e, "Difficulty seeding failed, aborting run");
                record_rule_failure(RuleName::SeedDifficulty, &e);
                return Err(e);
            }
        };
        record_rule_metrics(&seed);
        report.record(RuleName::SeedDifficulty, Ok(seed));

        let handles: Vec<(RuleName, JoinHandle<Result<RuleOutcome, InferenceError>>)> = RuleName::ALL
            .into_iter()
            .filter(|rule| *rule != RuleName::SeedDifficulty)
            .map(|rule| {
                debug!(rule = %rule, depends_on = ?rule.depends_on(), "launching rule");
                let rules = Arc::clone(&rules);
                let handle = tokio::spawn(async move { rules.run(rule).await }.in_current_span());
                (rule, handle)
            })
            .collect();

        for (rule, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(InferenceError::Task {
                    rule,
                    message: e.to_string(),
                }),
            };
            match &result {
                Ok(outcome) => record_rule_metrics(outcome),
                Err(e) => record_rule_failure(rule, e),
            }
            report.record(rule, result);
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        record_run_metrics(&report);
        info!(
            success = report.is_success(),
            latency_ms = report.elapsed_ms,
            "Inference run finished"
        );

        Ok(report)
    }
}
