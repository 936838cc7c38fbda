//! Valuation engine: owns the inference session and turns a finalized
//! property into a price.
//!
//! - Lazily loads the model on first use; concurrent callers share one in-flight load
//!   and all observe its outcome, success or failure
//! - A failed load leaves the engine uninitialized so a later call can retry
//! - Decodes the model's log10 output and composes the ±10% result

use crate::domain::{
    DomainError, FeatureVector, PropertyInput, ValuationResult, compose_result, encode,
};
use crate::ports::{InferenceSession, ModelLoader};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type LoadOutcome = Result<Arc<dyn InferenceSession>, DomainError>;
type InFlightLoad = Shared<BoxFuture<'static, LoadOutcome>>;

/// Valuation engine. Share it behind an `Arc`; the session lives as long as the engine.
pub struct ValuationEngine {
    loader: Arc<dyn ModelLoader>,
    session: OnceLock<Arc<dyn InferenceSession>>,
    /// Load currently running, if any. Cleared once it settles.
    in_flight: Mutex<Option<InFlightLoad>>,
    /// Serializes runs for sessions that cannot run concurrently.
    run_lock: Mutex<()>,
}

impl ValuationEngine {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            session: OnceLock::new(),
            in_flight: Mutex::new(None),
            run_lock: Mutex::new(()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session.get().is_some()
    }

    /// Load the model if no session exists yet. Idempotent; concurrent callers
    /// await the same load instead of starting another.
    pub async fn initialize(&self) -> Result<(), DomainError> {
        self.session().await.map(|_| ())
    }

    async fn session(&self) -> LoadOutcome {
        if let Some(session) = self.session.get() {
            return Ok(Arc::clone(session));
        }

        let load = {
            let mut slot = self.in_flight.lock().await;
            if let Some(session) = self.session.get() {
                return Ok(Arc::clone(session));
            }
            match slot.as_ref() {
                Some(load) => load.clone(),
                None => {
                    let load = load_session(Arc::clone(&self.loader)).boxed().shared();
                    *slot = Some(load.clone());
                    load
                }
            }
        };

        let outcome = load.clone().await;
        if let Ok(session) = &outcome {
            // Publish before clearing the slot so late callers find the session.
            let _ = self.session.set(Arc::clone(session));
        }
        let mut slot = self.in_flight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&load)) {
            *slot = None;
        }
        outcome
    }

    /// Run one feature row and decode it into a price. Initializes on first use.
    pub async fn predict(&self, features: &FeatureVector) -> Result<f64, DomainError> {
        let session = self.session().await?;
        let output = if session.supports_concurrent_runs() {
            session.run(features).await?
        } else {
            let _guard = self.run_lock.lock().await;
            session.run(features).await?
        };
        let price = decode(output)?;
        debug!(log10_price = output, price, "prediction decoded");
        Ok(price)
    }

    /// Encode, predict and compose. The submission boundary for the UI.
    pub async fn valuate(&self, input: &PropertyInput) -> Result<ValuationResult, DomainError> {
        let features = encode(input);
        let price = self.predict(&features).await?;
        let result = compose_result(price, input.size_sqm);
        info!(
            city_id = input.city_id,
            region_id = input.region_id,
            estimate = result.point_estimate,
            "valuation complete"
        );
        Ok(result)
    }

    /// Time `runs` valuations of the same input on an initialized session.
    /// Model loading is excluded from the timing.
    pub async fn benchmark(
        &self,
        input: &PropertyInput,
        runs: usize,
    ) -> Result<BenchmarkReport, DomainError> {
        self.initialize().await?;
        let runs = runs.max(1);
        let features = encode(input);

        let started = Instant::now();
        let first = self.predict(&features).await?;
        let mut deterministic = true;
        for _ in 1..runs {
            let price = self.predict(&features).await?;
            deterministic &= price.to_bits() == first.to_bits();
        }
        let total = started.elapsed();

        Ok(BenchmarkReport {
            runs,
            average: total / runs as u32,
            deterministic,
            result: compose_result(first, input.size_sqm),
        })
    }
}

async fn load_session(loader: Arc<dyn ModelLoader>) -> LoadOutcome {
    let started = Instant::now();
    info!(source = %loader.describe(), "loading valuation model");
    match loader.load().await {
        Ok(session) => {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "valuation model loaded"
            );
            Ok(session)
        }
        Err(e) => {
            warn!(error = %e, "valuation model failed to load");
            Err(e)
        }
    }
}

/// Inverse of the training target transform: `price = 10^output`.
pub fn decode(output: f32) -> Result<f64, DomainError> {
    let price = 10f64.powf(f64::from(output));
    if !price.is_finite() || price <= 0.0 {
        return Err(DomainError::Inference(format!(
            "model output {} does not decode to a positive price",
            output
        )));
    }
    Ok(price)
}

/// Outcome of [`ValuationEngine::benchmark`].
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub runs: usize,
    pub average: Duration,
    /// True when every run returned the bit-identical price.
    pub deterministic: bool,
    pub result: ValuationResult,
}

impl BenchmarkReport {
    pub fn predictions_per_sec(&self) -> f64 {
        let secs = self.average.as_secs_f64();
        if secs > 0.0 { 1.0 / secs } else { f64::INFINITY }
    }
}
