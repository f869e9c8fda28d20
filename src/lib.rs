//! # route-inference
//!
//! Fixpoint-driven forward chaining over a ski-area RDF graph.
//!
//! The crate answers one question:
//!
//! > Which facts follow from the graph once every rule has stopped producing new ones?
//!
//! ## Core Contract
//!
//! 1. Each rule is an insert-only update paired with a counting probe
//! 2. A rule is re-applied until its probe count stops growing
//! 3. Rules run in dependency order, independent chains concurrently
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator → RuleSet → FixpointRunner → GraphStore (SPARQL or Memory)
//!                   └──────── single-shot ────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Store errors abort the failing rule and are never retried or swallowed
//! - belongs-to is computed once per run, however many rules depend on it
//! - Once seed-difficulty succeeds, every rule's outcome or failure is reported;
//!   a seed failure aborts the run and is returned as the error

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod config;
pub mod store;
pub mod fixpoint;
pub mod rules;
pub mod orchestrator;
pub mod telemetry;

// Re-exports
pub use types::{
    Class, Predicate, Difficulty, Resource, Object, Triple,
    RuleName, UpdateSpec, QuerySpec, FixpointRule,
    FixpointOutcome, RuleOutcome, InferenceReport,
    DEFAULT_NAMESPACE,
};
pub use error::{InferenceError, StorePhase, BoxedStoreError};
pub use config::InferenceConfig;
pub use store::{GraphStore, InMemoryGraphStore};
#[cfg(feature = "sparql")]
pub use store::{SparqlConfig, SparqlGraphStore};
pub use fixpoint::FixpointRunner;
pub use rules::RuleSet;
pub use orchestrator::Orchestrator;
