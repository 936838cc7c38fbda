//! Core domain layer. No external I/O dependencies.
//!
//! Catalog, wizard state machine, feature encoding and pricing rules live here.

pub mod catalog;
pub mod encoder;
pub mod entities;
pub mod errors;
pub mod pricing;
pub mod wizard;

pub use catalog::{City, LocationCatalog, Region};
pub use encoder::encode;
pub use entities::{
    Category, CityId, FEATURE_COUNT, FeatureVector, PropertyInput, Purpose, RegionId,
    ValuationResult,
};
pub use errors::{DomainError, ValidationFailure, ValidationReport};
pub use pricing::{RANGE_BAND, compose_result, format_amount};
pub use wizard::{Field, Wizard, WizardEvent, WizardState, WizardStep, reduce};
