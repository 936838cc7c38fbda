//! Loads the governorate/region dataset from versioned JSON.
//!
//! The default dataset is embedded at compile time; a file path can override it.
//!
//! The embedded region ids are placeholders numbered from 0 inside each city.
//! The model was trained on a different region code space (sample inputs use
//! codes such as 500 for Tunis), and region codes reach the model unscaled, so
//! predictions made with the embedded dataset are not trustworthy. Supply the
//! training dataset through `PROPVAL_CATALOG_PATH`; a dataset may declare
//! `"placeholder_region_codes": true` to flag itself the same way.

use crate::domain::{City, DomainError, LocationCatalog};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Governorates 0..=23 and their regions, embedded at compile time.
const EMBEDDED_DATASET: &str = include_str!("../../../data/tunisia_regions.json");

#[derive(Debug, Deserialize)]
struct Dataset {
    version: String,
    cities: Vec<City>,
    #[serde(default)]
    placeholder_region_codes: bool,
}

pub fn parse(json: &str) -> Result<LocationCatalog, DomainError> {
    let dataset: Dataset = serde_json::from_str(json)
        .map_err(|e| DomainError::Catalog(format!("invalid location dataset: {}", e)))?;
    Ok(LocationCatalog::new(dataset.version, dataset.cities)?
        .with_placeholder_region_codes(dataset.placeholder_region_codes))
}

/// Catalog built from the dataset shipped with the binary.
pub fn load_embedded() -> Result<LocationCatalog, DomainError> {
    let catalog = parse(EMBEDDED_DATASET)?;
    info!(
        version = catalog.version(),
        cities = catalog.len(),
        "location catalog loaded (embedded)"
    );
    Ok(catalog)
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<LocationCatalog, DomainError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::Catalog(format!("read {}: {}", path.display(), e)))?;
    let catalog = parse(&json)?;
    info!(
        path = %path.display(),
        version = catalog.version(),
        cities = catalog.len(),
        "location catalog loaded"
    );
    Ok(catalog)
}
