//! ONNX adapter. Loads the frozen regression model with tract.
//!
//! The artifact has one input (`float_input`, float32 1x7) and one output
//! holding a single float: log10 of the price.

use crate::domain::{DomainError, FEATURE_COUNT, FeatureVector};
use crate::ports::{InferenceSession, ModelLoader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tract_onnx::prelude::*;
use tracing::{debug, info};

type Plan = TypedRunnableModel<TypedModel>;

/// Loads an ONNX file from disk into an optimized tract plan.
pub struct OnnxModelLoader {
    path: PathBuf,
}

impl OnnxModelLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse, pin the input shape to 1x7 float32, optimize. CPU-bound.
    fn build_plan(path: &Path) -> TractResult<(Plan, String)> {
        let mut model = tract_onnx::onnx().model_for_path(path)?;

        let inputs = model.input_outlets()?.to_vec();
        if inputs.len() != 1 {
            anyhow::bail!("expected 1 model input, found {}", inputs.len());
        }
        let input_name = model.node(inputs[0].node).name.clone();

        model.set_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())?;
        let plan = model.into_optimized()?.into_runnable()?;
        Ok((plan, input_name))
    }
}

#[async_trait::async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self) -> Result<Arc<dyn InferenceSession>, DomainError> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(DomainError::ModelLoad(format!(
                "model artifact not found at {}",
                self.path.display()
            )));
        }

        let path = self.path.clone();
        let (plan, input_name) = tokio::task::spawn_blocking(move || Self::build_plan(&path))
            .await
            .map_err(|e| DomainError::ModelLoad(format!("model load task failed: {}", e)))?
            .map_err(|e| {
                DomainError::ModelLoad(format!("{}: {:#}", self.path.display(), e))
            })?;

        info!(
            path = %self.path.display(),
            input = %input_name,
            "ONNX model ready"
        );
        Ok(Arc::new(OnnxSession {
            plan: Arc::new(plan),
        }))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An optimized tract plan. `run` takes `&self`, so calls may overlap.
pub struct OnnxSession {
    plan: Arc<Plan>,
}

impl OnnxSession {
    fn forward(plan: &Plan, values: [f32; FEATURE_COUNT]) -> Result<f32, DomainError> {
        let input = Tensor::from_shape(&[1, FEATURE_COUNT], &values[..])
            .map_err(|e| DomainError::Inference(format!("build input tensor: {}", e)))?;

        let outputs = plan
            .run(tvec!(input.into()))
            .map_err(|e| DomainError::Inference(format!("forward pass: {:#}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| DomainError::Inference("model produced no outputs".into()))?;
        let values = output
            .as_slice::<f32>()
            .map_err(|e| DomainError::Inference(format!("read output tensor: {}", e)))?;

        match values {
            [value] => Ok(*value),
            other => Err(DomainError::Inference(format!(
                "expected a single output value, got {}",
                other.len()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl InferenceSession for OnnxSession {
    async fn run(&self, features: &FeatureVector) -> Result<f32, DomainError> {
        let plan = Arc::clone(&self.plan);
        let values = features.values();
        let value = tokio::task::spawn_blocking(move || Self::forward(&plan, values))
            .await
            .map_err(|e| DomainError::Inference(format!("inference task failed: {}", e)))??;
        debug!(log10_price = value, "forward pass complete");
        Ok(value)
    }
}
