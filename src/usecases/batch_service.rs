//! Batch valuation: value every property listed in a CSV file.
//!
//! Each row goes through the same wizard reducer as interactive input, so the
//! validation rules are identical. Invalid rows and failed predictions are
//! reported per row; a model that cannot load aborts the whole batch.

use crate::adapters::batch::{BatchRecord, BatchRow, parse_rows, records_to_csv};
use crate::domain::{
    Category, DomainError, LocationCatalog, PropertyInput, Purpose, Wizard, WizardEvent,
};
use crate::usecases::ValuationEngine;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

/// Outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub output_path: PathBuf,
    pub valued: usize,
    pub failed: usize,
}

pub struct BatchService {
    engine: Arc<ValuationEngine>,
    catalog: Arc<LocationCatalog>,
    reports_dir: PathBuf,
}

impl BatchService {
    pub fn new(
        engine: Arc<ValuationEngine>,
        catalog: Arc<LocationCatalog>,
        reports_dir: PathBuf,
    ) -> Self {
        Self {
            engine,
            catalog,
            reports_dir,
        }
    }

    /// Value every row of `input` and write a timestamped result CSV into the reports dir.
    pub async fn run_file(&self, input: &Path) -> Result<BatchSummary, DomainError> {
        let data = fs::read(input)
            .await
            .map_err(|e| DomainError::Batch(format!("read {}: {}", input.display(), e)))?;
        let rows = parse_rows(&data)
            .map_err(|e| DomainError::Batch(format!("parse {}: {}", input.display(), e)))?;
        info!(path = %input.display(), rows = rows.len(), "batch valuation started");

        let records = self.value_rows(&rows).await?;
        let valued = records.iter().filter(|r| r.is_ok()).count();
        let failed = records.len() - valued;

        fs::create_dir_all(&self.reports_dir)
            .await
            .map_err(|e| DomainError::Batch(format!("Failed to create reports dir: {}", e)))?;
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("batch");
        let filename = format!(
            "valuation_{}_{}.csv",
            stem,
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let output_path = self.reports_dir.join(filename);

        let csv = records_to_csv(&records)
            .map_err(|e| DomainError::Batch(format!("Failed to generate CSV: {}", e)))?;
        fs::write(&output_path, csv)
            .await
            .map_err(|e| DomainError::Batch(format!("Failed to write report: {}", e)))?;

        info!(
            path = %output_path.display(),
            valued,
            failed,
            "batch valuation complete"
        );
        Ok(BatchSummary {
            output_path,
            valued,
            failed,
        })
    }

    /// Value rows in order. Row numbers are 1-based, excluding the header.
    pub async fn value_rows(&self, rows: &[BatchRow]) -> Result<Vec<BatchRecord>, DomainError> {
        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let mut record = BatchRecord::for_row(i + 1, row);
            match self.to_input(row) {
                Ok(input) => match self.engine.valuate(&input).await {
                    Ok(result) => {
                        record.point_estimate = Some(result.point_estimate);
                        record.low = Some(result.low);
                        record.high = Some(result.high);
                        record.price_per_sqm = Some(result.price_per_sqm);
                    }
                    Err(e @ DomainError::ModelLoad(_)) => return Err(e),
                    Err(e) => {
                        warn!(row = record.row, error = %e, "batch row failed");
                        record.error = Some(e.to_string());
                    }
                },
                Err(message) => record.error = Some(message),
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Drive one row through a fresh wizard and submit it.
    fn to_input(&self, row: &BatchRow) -> Result<PropertyInput, String> {
        let purpose: Purpose = row.purpose.parse()?;
        let category: Category = row.category.parse()?;
        let city = parse_number::<u8>("city", &row.city)?;
        let region = parse_number::<u16>("region", &row.region)?;
        let rooms = parse_number::<u32>("rooms", &row.rooms)?;
        let bathrooms = parse_number::<u32>("bathrooms", &row.bathrooms)?;
        // The wizard floors counts at 1; a file saying 0 is an error, not a 1.
        if rooms == 0 || bathrooms == 0 {
            return Err("rooms and bathrooms must be at least 1".to_string());
        }

        let mut wizard = Wizard::new(Arc::clone(&self.catalog));
        for event in [
            WizardEvent::SetPurpose(purpose),
            WizardEvent::SetCategory(category),
            WizardEvent::SetCity(Some(city)),
            WizardEvent::SetRegion(Some(region)),
            WizardEvent::SetRooms(rooms),
            WizardEvent::SetBathrooms(bathrooms),
            WizardEvent::SetSize(row.size.clone()),
        ] {
            wizard.dispatch(event);
        }
        wizard.submit().map_err(|report| report.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{} must be a whole number, got '{}'", field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::load_embedded;
    use crate::adapters::model::MockModelLoader;

    fn service(loader: MockModelLoader, reports_dir: PathBuf) -> BatchService {
        let engine = Arc::new(ValuationEngine::new(Arc::new(loader)));
        let catalog = Arc::new(load_embedded().unwrap());
        BatchService::new(engine, catalog, reports_dir)
    }

    fn row(cells: [&str; 7]) -> BatchRow {
        BatchRow {
            purpose: cells[0].into(),
            category: cells[1].into(),
            city: cells[2].into(),
            region: cells[3].into(),
            rooms: cells[4].into(),
            bathrooms: cells[5].into(),
            size: cells[6].into(),
        }
    }

    #[tokio::test]
    async fn values_good_rows_and_reports_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(MockModelLoader::new(5.30103), dir.path().to_path_buf());

        let records = svc
            .value_rows(&[
                row(["buy", "0", "22", "14", "2", "1", "80"]),
                row(["buy", "0", "22", "14", "2", "1", "0"]),
                row(["rent", "apartment", "22", "999", "1", "1", "50"]),
                row(["swap", "0", "22", "14", "1", "1", "50"]),
                row(["buy", "0", "22", "14", "0", "1", "50"]),
            ])
            .await
            .unwrap();

        assert_eq!(records[0].point_estimate, Some(200_000));
        assert_eq!(records[0].price_per_sqm, Some(2_500));
        assert!(records[1].error.as_deref().unwrap().contains("Size must be greater than 0"));
        assert!(records[2].error.as_deref().unwrap().contains("region"));
        assert!(records[3].error.as_deref().unwrap().contains("unknown purpose"));
        assert!(records[4].error.is_some());
        assert!(records[1..].iter().all(|r| r.point_estimate.is_none()));
    }

    #[tokio::test]
    async fn model_load_failure_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockModelLoader::new(5.0).with_failing_loads(1),
            dir.path().to_path_buf(),
        );
        let err = svc
            .value_rows(&[row(["buy", "0", "22", "14", "2", "1", "80"])])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ModelLoad(_)));
    }

    #[tokio::test]
    async fn inference_failure_fails_only_its_row() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockModelLoader::new(5.0).with_failing_runs(1),
            dir.path().to_path_buf(),
        );
        let good = row(["buy", "5", "19", "3", "4", "2", "220"]);
        let records = svc.value_rows(&[good.clone(), good]).await.unwrap();
        assert!(records[0].error.as_deref().unwrap().contains("Inference failed"));
        assert_eq!(records[1].point_estimate, Some(100_000));
    }

    #[tokio::test]
    async fn run_file_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("listings.csv");
        std::fs::write(
            &input,
            "purpose,category,city,region,rooms,bathrooms,size\n\
             buy,0,22,14,2,1,80\n\
             rent,0,22,14,2,1,\n",
        )
        .unwrap();

        let reports = dir.path().join("reports");
        let svc = service(MockModelLoader::new(5.30103), reports.clone());
        let summary = svc.run_file(&input).await.unwrap();

        assert_eq!(summary.valued, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.output_path.starts_with(&reports));
        let written = std::fs::read_to_string(&summary.output_path).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(written.contains("200000"));
        assert!(written.contains("Please enter the size"));
    }
}
