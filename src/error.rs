//! Error types for inference runs.
//!
//! Store failures are the only failures the rules themselves produce. They are
//! never retried: the enclosing loop aborts and the error travels up to the
//! orchestrator, which records it against the failing rule.

use std::sync::Arc;

use crate::types::RuleName;

/// Boxed error coming from a [`GraphStore`](crate::store::GraphStore) backend.
pub type BoxedStoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// A mutating update.
    Update,
    /// A counting probe.
    Probe,
}

impl std::fmt::Display for StorePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Probe => write!(f, "probe"),
        }
    }
}

/// Error type for rule execution and orchestration.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// A store operation failed.
    #[error("{rule}: store {phase} failed (last count: {}): {source}", display_count(.last_count))]
    Store {
        /// Rule that issued the operation.
        rule: RuleName,
        /// Operation that failed.
        phase: StorePhase,
        /// Last successfully measured probe count, if any probe succeeded.
        last_count: Option<u64>,
        /// Backend error.
        #[source]
        source: BoxedStoreError,
    },

    /// A rule this one depends on failed.
    #[error("{rule}: dependency {dependency} failed: {source}")]
    Dependency {
        /// Rule that could not run.
        rule: RuleName,
        /// Upstream rule.
        dependency: RuleName,
        /// Shared upstream failure.
        #[source]
        source: Arc<InferenceError>,
    },

    /// A fixpoint loop exceeded the configured iteration cap.
    #[error("{rule}: no fixpoint after {limit} iterations (last count: {last_count})")]
    IterationLimit {
        /// Rule that did not converge.
        rule: RuleName,
        /// Configured cap.
        limit: u32,
        /// Count after the last pass.
        last_count: u64,
    },

    /// A memoized failure handed to a caller after the first.
    #[error(transparent)]
    Shared(Arc<InferenceError>),

    /// The task running a rule panicked or was cancelled.
    #[error("{rule}: task failed: {message}")]
    Task {
        /// Rule the task was running.
        rule: RuleName,
        /// Join error description.
        message: String,
    },
}

impl InferenceError {
    /// Wrap a backend error.
    pub fn store(
        rule: RuleName,
        phase: StorePhase,
        last_count: Option<u64>,
        source: impl Into<BoxedStoreError>,
    ) -> Self {
        Self::Store {
            rule,
            phase,
            last_count,
            source: source.into(),
        }
    }

    /// Rule the error is attributed to.
    pub fn rule(&self) -> RuleName {
        match self {
            Self::Store { rule, .. }
            | Self::Dependency { rule, .. }
            | Self::IterationLimit { rule, .. }
            | Self::Task { rule, .. } => *rule,
            Self::Shared(inner) => inner.rule(),
        }
    }

    /// Last successful probe count recorded with the failure.
    pub fn last_count(&self) -> Option<u64> {
        match self {
            Self::Store { last_count, .. } => *last_count,
            Self::IterationLimit { last_count, .. } => Some(*last_count),
            Self::Shared(inner) => inner.last_count(),
            Self::Dependency { .. } | Self::Task { .. } => None,
        }
    }
}

fn display_count(count: &Option<u64>) -> String {
    count.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}
