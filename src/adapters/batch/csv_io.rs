//! CSV utilities for batch valuation. Uses the `csv` crate for safe (de)serialization.
//!
//! Input columns: `purpose,category,city,region,rooms,bathrooms,size`.
//! Every cell is read as text so a bad value fails its row, not the whole file.

use serde::{Deserialize, Serialize};

/// One property to value, as written in the input file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRow {
    pub purpose: String,
    pub category: String,
    pub city: String,
    pub region: String,
    pub rooms: String,
    pub bathrooms: String,
    pub size: String,
}

/// One output line: the echoed input plus either a result or an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchRecord {
    pub row: usize,
    pub purpose: String,
    pub category: String,
    pub city: String,
    pub region: String,
    pub rooms: String,
    pub bathrooms: String,
    pub size: String,
    pub point_estimate: Option<u64>,
    pub low: Option<u64>,
    pub high: Option<u64>,
    pub price_per_sqm: Option<u64>,
    pub error: Option<String>,
}

impl BatchRecord {
    pub fn for_row(row: usize, input: &BatchRow) -> Self {
        Self {
            row,
            purpose: input.purpose.clone(),
            category: input.category.clone(),
            city: input.city.clone(),
            region: input.region.clone(),
            rooms: input.rooms.clone(),
            bathrooms: input.bathrooms.clone(),
            size: input.size.clone(),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse input rows. Cells are trimmed; header names must match [`BatchRow`].
pub fn parse_rows(data: &[u8]) -> Result<Vec<BatchRow>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);
    rdr.deserialize().collect()
}

/// Serialize output records with a header row.
pub fn records_to_csv(records: &[BatchRecord]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    let bytes = wtr.into_inner().map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;

    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}
