//! Graph storage backends.

pub mod memory;

#[cfg(feature = "sparql")]
pub mod sparql;

use async_trait::async_trait;
use crate::types::{QuerySpec, UpdateSpec};

/// Trait for graph storage backends.
///
/// Implementations must be safe to call with the same update repeatedly
/// (inserting a present fact is a no-op), and a count issued after an
/// acknowledged update must observe that update.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Apply a declarative insert-where mutation.
    async fn update(&self, op: &UpdateSpec) -> Result<(), Self::Error>;

    /// Count the facts matching a probe.
    async fn count(&self, probe: &QuerySpec) -> Result<u64, Self::Error>;
}

pub use memory::InMemoryGraphStore;

#[cfg(feature = "sparql")]
pub use sparql::{SparqlConfig, SparqlGraphStore};
