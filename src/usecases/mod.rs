//! Application use cases. Orchestrate domain logic via ports.

pub mod batch_service;
pub mod valuation_engine;

pub use batch_service::{BatchService, BatchSummary};
pub use valuation_engine::{BenchmarkReport, ValuationEngine};
