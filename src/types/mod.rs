//! Core types for route inference.

pub mod vocab;
pub mod triple;
pub mod rule;
pub mod report;

pub use vocab::{Class, Predicate, Difficulty, DEFAULT_NAMESPACE, SEEDED_CLASSES};
pub use triple::{Resource, Object, Triple};
pub use rule::{RuleName, UpdateSpec, QuerySpec, FixpointRule};
pub use report::{FixpointOutcome, RuleOutcome, InferenceReport};
