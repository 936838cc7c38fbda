//! Infrastructure adapters. Implement outbound ports.
//!
//! Model runtime, location dataset, CSV files, terminal UI. Map errors to DomainError.

pub mod batch;
pub mod catalog;
pub mod model;
pub mod ui;
