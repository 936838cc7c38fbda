//! Batch valuation file formats.

pub mod csv_io;

pub use csv_io::{BatchRecord, BatchRow, parse_rows, records_to_csv};
