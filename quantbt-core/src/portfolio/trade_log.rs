//! Trade log records and CSV export.

use crate::domain::OrderSide;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// One executed fill as recorded by the ledger.
///
/// Field order defines the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: f64,
    pub symbol: String,
    pub quantity: u64,
    pub direction: OrderSide,
    pub price: f64,
    pub commission: f64,
    pub currency: String,
}

#[derive(Debug, Error)]
pub enum TradeLogError {
    #[error("trade log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trade log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write records as CSV with a header row. The header is written even when
/// there are no records.
pub fn write_csv<W: Write>(records: &[TradeRecord], writer: W) -> Result<(), TradeLogError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record([
        "timestamp",
        "symbol",
        "quantity",
        "direction",
        "price",
        "commission",
        "currency",
    ])?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv(records: &[TradeRecord], path: &Path) -> Result<(), TradeLogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_csv(records, file)
}
