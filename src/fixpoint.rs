//! Fixpoint runner.
//!
//! Drives a single rule to fixpoint by alternating a full-graph update pass
//! with a counting probe until the count stops growing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::InferenceConfig;
use crate::error::{InferenceError, StorePhase};
use crate::store::GraphStore;
use crate::types::{FixpointOutcome, FixpointRule, RuleName, UpdateSpec};

/// Runs rules against a store until their probe stops increasing.
///
/// ## Algorithm
///
/// 1. Measure the probe: `previous`
/// 2. Apply the update over the whole graph
/// 3. Measure the probe again: `count`
/// 4. If `count > previous`, set `previous = count` and go to 2
/// 5. Otherwise the rule has reached fixpoint
///
/// Passes are strictly sequential: pass n+1 reads what pass n wrote. A probe
/// that goes *down* is treated as convergence and logged as a warning, since the
/// rules only ever insert facts.
pub struct FixpointRunner<S: GraphStore> {
    store: Arc<S>,
    config: InferenceConfig,
}

impl<S: GraphStore> Clone for FixpointRunner<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: GraphStore> FixpointRunner<S> {
    /// Create a runner over a store.
    pub fn new(store: Arc<S>, config: InferenceConfig) -> Self {
        Self { store, config }
    }

    /// Drive `rule` to fixpoint.
    ///
    /// Store failures abort the loop and are returned unchanged inside
    /// [`InferenceError::Store`], together with the last successful probe count.
    pub async fn run_to_fixpoint(&self, rule: &FixpointRule) -> Result<FixpointOutcome, InferenceError> {
        let baseline = self.probe(rule, None).await?;
        let mut previous = baseline;
        let mut iterations: u32 = 0;
        let mut productive_iterations: u32 = 0;

        loop {
            if let Some(limit) = self.config.max_iterations {
                if iterations >= limit {
                    return Err(InferenceError::IterationLimit {
                        rule: rule.name,
                        limit,
                        last_count: previous,
                    });
                }
            }

            self.store
                .update(&rule.update)
                .await
                .map_err(|e| InferenceError::store(rule.name, StorePhase::Update, Some(previous), e))?;
            let count = self.probe(rule, Some(previous)).await?;
            iterations += 1;

            debug!(
                rule = %rule.name,
                iteration = iterations,
                previous,
                count,
                "fixpoint pass"
            );

            if count > previous {
                productive_iterations += 1;
                previous = count;
                continue;
            }

            if count < previous {
                warn!(
                    rule = %rule.name,
                    previous,
                    count,
                    "probe count decreased; treating as fixpoint"
                );
            }

            info!(
                rule = %rule.name,
                iterations,
                baseline,
                final_count = count,
                "fixpoint reached"
            );

            return Ok(FixpointOutcome {
                rule: rule.name,
                baseline_count: baseline,
                final_count: count,
                iterations,
                productive_iterations,
            });
        }
    }

    /// Apply a single-shot update on behalf of `rule`.
    pub async fn apply_once(&self, rule: RuleName, op: &UpdateSpec) -> Result<(), InferenceError> {
        self.store
            .update(op)
            .await
            .map_err(|e| InferenceError::store(rule, StorePhase::Update, None, e))?;
        debug!(rule = %rule, op = op.label(), "single-shot update applied");
        Ok(())
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn probe(&self, rule: &FixpointRule, last_count: Option<u64>) -> Result<u64, InferenceError> {
        self.store
            .count(&rule.probe)
            .await
            .map_err(|e| InferenceError::store(rule.name, StorePhase::Probe, last_count, e))
    }
}
