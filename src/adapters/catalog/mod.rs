//! Location dataset adapters.

pub mod json_catalog;

pub use json_catalog::{load_embedded, load_from_path};
