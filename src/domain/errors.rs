//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use crate::domain::wizard::{Field, WizardStep};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    /// One or more wizard steps fail their predicate. User-correctable.
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// Location dataset is malformed. Unknown cities are not errors.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Model artifact missing, corrupt or incompatible. No prediction can run.
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Forward pass failed. Only this request is lost; the session stays usable.
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Batch valuation error: {0}")]
    Batch(String),

    #[error("UI error: {0}")]
    Ui(String),
}

/// A single failing field on a wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub step: WizardStep,
    pub field: Field,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(step: WizardStep, field: Field, message: impl Into<String>) -> Self {
        Self {
            step,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} ({}), {}: {}",
            self.step.number(),
            self.step,
            self.field,
            self.message
        )
    }
}

/// Every failure found by one `advance` or `submit` attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }

    /// Steps with at least one failure, in step order.
    pub fn steps(&self) -> BTreeSet<WizardStep> {
        self.failures.iter().map(|f| f.step).collect()
    }

    pub fn first_step(&self) -> Option<WizardStep> {
        self.steps().into_iter().next()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.failures.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join("; "))
    }
}
