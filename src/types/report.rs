//! Outcomes of fixpoint loops, rules and whole inference runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use super::rule::RuleName;
use crate::error::InferenceError;

/// Result of driving one rule to fixpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixpointOutcome {
    /// Rule that converged.
    pub rule: RuleName,
    /// Probe count before the first pass.
    pub baseline_count: u64,
    /// Probe count once the loop stopped.
    pub final_count: u64,
    /// Number of (update, probe) passes, including the confirming one.
    pub iterations: u32,
    /// Passes whose probe count grew.
    pub productive_iterations: u32,
}

impl FixpointOutcome {
    /// Facts the loop added, as measured by the probe.
    pub fn derived(&self) -> u64 {
        self.final_count.saturating_sub(self.baseline_count)
    }
}

/// Result of one rule in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    /// The rule.
    pub rule: RuleName,
    /// Update operations issued, across all phases.
    pub updates_applied: u32,
    /// Fixpoint details for iterative rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixpoint: Option<FixpointOutcome>,
    /// Wall-clock time spent in the rule.
    pub elapsed_ms: u64,
}

impl RuleOutcome {
    /// Outcome of a rule that only issues single-shot updates.
    pub fn single_shot(rule: RuleName, updates_applied: u32, elapsed_ms: u64) -> Self {
        Self {
            rule,
            updates_applied,
            fixpoint: None,
            elapsed_ms,
        }
    }
}

/// Aggregate report of an orchestrated inference run.
#[derive(Debug, Serialize)]
pub struct InferenceReport {
    /// Correlation id of the run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Total wall-clock time.
    pub elapsed_ms: u64,
    /// Rules that completed.
    pub outcomes: BTreeMap<RuleName, RuleOutcome>,
    /// Rules that failed.
    #[serde(serialize_with = "serialize_failures")]
    pub failures: BTreeMap<RuleName, InferenceError>,
}

impl InferenceReport {
    /// Create an empty report for a run starting now.
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            elapsed_ms: 0,
            outcomes: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    /// Record the result of a rule.
    pub fn record(&mut self, rule: RuleName, result: Result<RuleOutcome, InferenceError>) {
        match result {
            Ok(outcome) => {
                self.outcomes.insert(rule, outcome);
            }
            Err(e) => {
                self.failures.insert(rule, e);
            }
        }
    }

    /// True if no rule failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Outcome of a rule, if it completed.
    pub fn outcome(&self, rule: RuleName) -> Option<&RuleOutcome> {
        self.outcomes.get(&rule)
    }

    /// Failure of a rule, if it failed.
    pub fn failure(&self, rule: RuleName) -> Option<&InferenceError> {
        self.failures.get(&rule)
    }

    /// Collapse into the first failure (in rule order), or the completed outcomes.
    pub fn into_result(mut self) -> Result<BTreeMap<RuleName, RuleOutcome>, InferenceError> {
        match self.failures.pop_first() {
            Some((_, e)) => Err(e),
            None => Ok(self.outcomes),
        }
    }
}

fn serialize_failures<S: Serializer>(
    failures: &BTreeMap<RuleName, InferenceError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(failures.iter().map(|(rule, e)| (rule, e.to_string())))
}
