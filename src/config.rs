//! Inference run configuration.
//!
//! ## Configuration
//!
//! - `INFERENCE_MAX_ITERATIONS`: cap on passes per fixpoint loop (default: unlimited)

/// Configuration for fixpoint loops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Maximum (update, probe) passes per loop. `None` runs until fixpoint.
    pub max_iterations: Option<u32>,
}

impl InferenceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_iterations: std::env::var("INFERENCE_MAX_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &u32| n > 0),
        }
    }

    /// Unbounded loops.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Cap every loop at `max_iterations` passes.
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self {
            max_iterations: Some(max_iterations),
        }
    }
}
