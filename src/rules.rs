//! The ski-area rule set.
//!
//! | Rule | Mode |
//! |------|------|
//! | seed-difficulty | four sequential single-shot updates |
//! | duration | fixpoint |
//! | difficulty | fixpoint |
//! | belongs-to | single-shot first-element pass, then fixpoint |
//! | belongs-to-place | single-shot after belongs-to |
//! | belongs-to-restaurant | single-shot after belongs-to-place |
//!
//! belongs-to and belongs-to-place are memoized: the first caller computes,
//! later callers await the same result. A dependency's fixpoint is therefore
//! computed once no matter how many dependents ask for it. Each memoized step
//! runs as its own task, so a panic is stored as a [`InferenceError::Task`]
//! failure like any other error.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::{info, Instrument};

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::fixpoint::FixpointRunner;
use crate::store::GraphStore;
use crate::types::{FixpointRule, RuleName, RuleOutcome, UpdateSpec, SEEDED_CLASSES};

/// Memoized result of a rule other rules depend on.
type SharedOutcome = Result<RuleOutcome, Arc<InferenceError>>;

/// The six inference rules bound to one store.
pub struct RuleSet<S: GraphStore> {
    runner: FixpointRunner<S>,
    belongs_to: OnceCell<SharedOutcome>,
    belongs_to_place: OnceCell<SharedOutcome>,
}

impl<S: GraphStore + 'static> RuleSet<S> {
    /// Create a rule set over a store.
    pub fn new(store: Arc<S>, config: InferenceConfig) -> Self {
        Self {
            runner: FixpointRunner::new(store, config),
            belongs_to: OnceCell::new(),
            belongs_to_place: OnceCell::new(),
        }
    }

    /// Run a rule by name.
    pub async fn run(&self, rule: RuleName) -> Result<RuleOutcome, InferenceError> {
        match rule {
            RuleName::SeedDifficulty => self.seed_difficulty().await,
            RuleName::Duration => self.duration().await,
            RuleName::Difficulty => self.difficulty().await,
            RuleName::BelongsTo => self.belongs_to().await,
            RuleName::BelongsToPlace => self.belongs_to_place().await,
            RuleName::BelongsToRestaurant => self.belongs_to_restaurant().await,
        }
    }

    /// Tag blue/red/black runs and lifts with difficulty 1/2/3/0.
    ///
    /// The four sub-steps run one after another; a failure stops the rest.
    pub async fn seed_difficulty(&self) -> Result<RuleOutcome, InferenceError> {
        let start = Instant::now();
        for (class, difficulty) in SEEDED_CLASSES {
            self.runner
                .apply_once(RuleName::SeedDifficulty, &UpdateSpec::SeedDifficulty { class, difficulty })
                .await?;
        }
        Ok(RuleOutcome::single_shot(
            RuleName::SeedDifficulty,
            SEEDED_CLASSES.len() as u32,
            elapsed_ms(start),
        ))
    }

    /// Propagate durations up route chains.
    pub async fn duration(&self) -> Result<RuleOutcome, InferenceError> {
        self.fixpoint(&FixpointRule::DURATION).await
    }

    /// Propagate difficulties up route chains.
    ///
    /// Only meaningful once seed-difficulty has completed.
    pub async fn difficulty(&self) -> Result<RuleOutcome, InferenceError> {
        self.fixpoint(&FixpointRule::DIFFICULTY).await
    }

    /// Transitive route membership, computed at most once.
    pub async fn belongs_to(&self) -> Result<RuleOutcome, InferenceError> {
        self.memoized_belongs_to().await.clone().map_err(InferenceError::Shared)
    }

    /// Place membership, computed at most once, after belongs-to.
    pub async fn belongs_to_place(&self) -> Result<RuleOutcome, InferenceError> {
        self.memoized_belongs_to_place().await.clone().map_err(InferenceError::Shared)
    }

    /// Restaurant membership, after belongs-to-place.
    pub async fn belongs_to_restaurant(&self) -> Result<RuleOutcome, InferenceError> {
        let rule = RuleName::BelongsToRestaurant;
        require(rule, RuleName::BelongsToPlace, self.memoized_belongs_to_place().await)?;

        let start = Instant::now();
        self.runner.apply_once(rule, &UpdateSpec::BelongsToRestaurant).await?;
        info!(rule = %rule, "rule complete");
        Ok(RuleOutcome::single_shot(rule, 1, elapsed_ms(start)))
    }

    async fn fixpoint(&self, rule: &FixpointRule) -> Result<RuleOutcome, InferenceError> {
        fixpoint_outcome(&self.runner, rule).await
    }

    async fn memoized_belongs_to(&self) -> &SharedOutcome {
        self.belongs_to
            .get_or_init(|| {
                let runner = self.runner.clone();
                isolated(RuleName::BelongsTo, async move { compute_belongs_to(&runner).await })
            })
            .await
    }

    async fn memoized_belongs_to_place(&self) -> &SharedOutcome {
        self.belongs_to_place
            .get_or_init(|| async {
                let rule = RuleName::BelongsToPlace;
                if let Err(e) = require(rule, RuleName::BelongsTo, self.memoized_belongs_to().await) {
                    return Err(Arc::new(e));
                }

                let runner = self.runner.clone();
                isolated(rule, async move {
                    let start = Instant::now();
                    runner.apply_once(rule, &UpdateSpec::BelongsToPlace).await?;
                    info!(rule = %rule, "rule complete");
                    Ok::<_, InferenceError>(RuleOutcome::single_shot(rule, 1, elapsed_ms(start)))
                })
                .await
            })
            .await
    }
}

async fn fixpoint_outcome<S: GraphStore>(
    runner: &FixpointRunner<S>,
    rule: &FixpointRule,
) -> Result<RuleOutcome, InferenceError> {
    let start = Instant::now();
    let fixpoint = runner.run_to_fixpoint(rule).await?;
    Ok(RuleOutcome {
        rule: rule.name,
        updates_applied: fixpoint.iterations,
        fixpoint: Some(fixpoint),
        elapsed_ms: elapsed_ms(start),
    })
}

async fn compute_belongs_to<S: GraphStore>(runner: &FixpointRunner<S>) -> Result<RuleOutcome, InferenceError> {
    let start = Instant::now();
    runner.apply_once(RuleName::BelongsTo, &UpdateSpec::BelongsToFirst).await?;
    let mut outcome = fixpoint_outcome(runner, &FixpointRule::BELONGS_TO_REST).await?;
    outcome.updates_applied += 1;
    outcome.elapsed_ms = elapsed_ms(start);
    Ok(outcome)
}

/// Run `work` on its own task and memoize how it ended.
///
/// A panic or cancellation becomes [`InferenceError::Task`] for `rule`.
async fn isolated<F>(rule: RuleName, work: F) -> SharedOutcome
where
    F: Future<Output = Result<RuleOutcome, InferenceError>> + Send + 'static,
{
    let result = match tokio::spawn(work.in_current_span()).await {
        Ok(result) => result,
        Err(e) => Err(InferenceError::Task {
            rule,
            message: e.to_string(),
        }),
    };
    result.map_err(Arc::new)
}

/// Turn a failed dependency into a [`InferenceError::Dependency`] for `rule`.
fn require(rule: RuleName, dependency: RuleName, outcome: &SharedOutcome) -> Result<(), InferenceError> {
    match outcome {
        Ok(_) => Ok(()),
        Err(source) => Err(InferenceError::Dependency {
            rule,
            dependency,
            source: Arc::clone(source),
        }),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
