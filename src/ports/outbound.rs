//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, FeatureVector};
use std::sync::Arc;

/// Loads the frozen regression model. May take seconds on a cold start.
#[async_trait::async_trait]
pub trait ModelLoader: Send + Sync {
    /// Build a ready-to-run session. Missing, corrupt or incompatible
    /// artifacts fail with `DomainError::ModelLoad`.
    async fn load(&self) -> Result<Arc<dyn InferenceSession>, DomainError>;

    /// Human-readable source of the model (path, "mock", ...), for logs.
    fn describe(&self) -> String;
}

/// A loaded model. One forward pass per call.
#[async_trait::async_trait]
pub trait InferenceSession: Send + Sync {
    /// Run one 1x7 row and return the single raw output (log10 of price).
    async fn run(&self, features: &FeatureVector) -> Result<f32, DomainError>;

    /// Whether `run` may be called from several tasks at once.
    /// When false the engine queues calls and serves them one at a time.
    fn supports_concurrent_runs(&self) -> bool {
        true
    }
}
