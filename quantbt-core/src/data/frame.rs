//! CSV frame I/O shared by the local CSV provider and the cache.
//!
//! Headers are matched case-insensitively and `date` is accepted for
//! `timestamp`. Timestamps may be RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare
//! `YYYY-MM-DD` (midnight UTC). Empty numeric cells read as NaN and are left
//! for the validator to reject.

use super::provider::{DataError, PriceRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::io::{Read, Write};

pub const REQUIRED_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_number(text: &str) -> Result<f64, DataError> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    text.parse::<f64>()
        .map_err(|_| DataError::Validation(format!("not a number: '{text}'")))
}

/// Read rows from CSV.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<PriceRow>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| match h.to_lowercase().as_str() {
            "date" => "timestamp".to_string(),
            other => other.to_string(),
        })
        .collect();

    let mut index = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h == column) {
            Some(i) => *slot = i,
            None => missing.push(column),
        }
    }
    if !missing.is_empty() {
        return Err(DataError::Validation(format!(
            "missing columns: {}",
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let field = |i: usize| record.get(index[i]).unwrap_or("");
        let ts_text = field(0);
        let timestamp = parse_timestamp(ts_text)
            .ok_or_else(|| DataError::Validation(format!("unparseable timestamp '{ts_text}'")))?;
        rows.push(PriceRow {
            timestamp,
            open: parse_number(field(1))?,
            high: parse_number(field(2))?,
            low: parse_number(field(3))?,
            close: parse_number(field(4))?,
            volume: parse_number(field(5))?,
        });
    }
    Ok(rows)
}

/// Write rows as CSV with the canonical header.
pub fn write_rows<W: Write>(rows: &[PriceRow], writer: W) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(REQUIRED_COLUMNS)?;
    for row in rows {
        wtr.write_record([
            row.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            row.open.to_string(),
            row.high.to_string(),
            row.low.to_string(),
            row.close.to_string(),
            row.volume.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
