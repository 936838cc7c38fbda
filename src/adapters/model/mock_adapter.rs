//! Mock model for testing without an ONNX artifact.
//!
//! Returns a fixed log10 output. Load/run delays, injected failures and
//! run concurrency are configurable and observable.

use crate::domain::{DomainError, FeatureVector};
use crate::ports::{InferenceSession, ModelLoader};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

/// Mock model loader.
pub struct MockModelLoader {
    output: f32,
    load_delay: Duration,
    run_delay: Duration,
    concurrent_runs: bool,
    failing_loads: AtomicUsize,
    failing_runs: Arc<AtomicUsize>,
    loads: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockModelLoader {
    /// Loader whose session always returns `log10_output`.
    pub fn new(log10_output: f32) -> Self {
        Self {
            output: log10_output,
            load_delay: Duration::ZERO,
            run_delay: Duration::ZERO,
            concurrent_runs: true,
            failing_loads: AtomicUsize::new(0),
            failing_runs: Arc::new(AtomicUsize::new(0)),
            loads: AtomicUsize::new(0),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// Session reports it cannot run concurrently.
    pub fn sequential(mut self) -> Self {
        self.concurrent_runs = false;
        self
    }

    /// First `n` loads fail with `ModelLoad`.
    pub fn with_failing_loads(self, n: usize) -> Self {
        self.failing_loads.store(n, Ordering::SeqCst);
        self
    }

    /// First `n` runs fail with `Inference`.
    pub fn with_failing_runs(self, n: usize) -> Self {
        self.failing_runs.store(n, Ordering::SeqCst);
        self
    }

    /// Number of load attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Highest number of runs observed in flight at once.
    pub fn max_concurrent_runs(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrement `counter` if positive. True when a failure should be injected.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait::async_trait]
impl ModelLoader for MockModelLoader {
    async fn load(&self) -> Result<Arc<dyn InferenceSession>, DomainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        info!(output = self.output, "[MOCK] Simulating model load");

        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if take_failure(&self.failing_loads) {
            return Err(DomainError::ModelLoad("[MOCK] injected load failure".into()));
        }

        Ok(Arc::new(MockSession {
            output: self.output,
            run_delay: self.run_delay,
            concurrent_runs: self.concurrent_runs,
            failing_runs: Arc::clone(&self.failing_runs),
            in_flight: AtomicUsize::new(0),
            max_in_flight: Arc::clone(&self.max_in_flight),
        }))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// Session produced by [`MockModelLoader`].
pub struct MockSession {
    output: f32,
    run_delay: Duration,
    concurrent_runs: bool,
    failing_runs: Arc<AtomicUsize>,
    in_flight: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl InferenceSession for MockSession {
    async fn run(&self, _features: &FeatureVector) -> Result<f32, DomainError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.run_delay.is_zero() {
            tokio::time::sleep(self.run_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if take_failure(&self.failing_runs) {
            return Err(DomainError::Inference("[MOCK] injected run failure".into()));
        }
        Ok(self.output)
    }

    fn supports_concurrent_runs(&self) -> bool {
        self.concurrent_runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_loader() {
        let loader = MockModelLoader::new(5.5).with_failing_runs(1);
        let session = loader.load().await.unwrap();
        let row = FeatureVector::new([0.0; 7]);

        assert!(session.run(&row).await.is_err());
        assert_eq!(session.run(&row).await.unwrap(), 5.5);
        assert_eq!(loader.load_count(), 1);
        assert_eq!(loader.describe(), "mock");
    }
}
