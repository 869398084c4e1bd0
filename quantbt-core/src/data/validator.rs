//! Row validation: completeness, ordering and range checks.
//!
//! Rows outside the requested range are rejected rather than trimmed: data
//! before the start indicates leakage and data after the end indicates
//! lookahead.

use super::provider::{DataError, DataRequest, PriceRow};

#[derive(Debug, Clone, Copy, Default)]
pub struct DataValidator;

impl DataValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate and return rows sorted by timestamp.
    pub fn validate(
        &self,
        mut rows: Vec<PriceRow>,
        request: &DataRequest,
    ) -> Result<Vec<PriceRow>, DataError> {
        if rows.is_empty() {
            return Err(DataError::Validation("received empty data frame".into()));
        }

        if !rows.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
            rows.sort_by_key(|r| r.timestamp);
        }
        if rows.windows(2).any(|w| w[0].timestamp == w[1].timestamp) {
            return Err(DataError::Validation("duplicate timestamps detected".into()));
        }
        if rows.iter().any(PriceRow::has_nan) {
            return Err(DataError::Validation(
                "NaN values detected in required columns".into(),
            ));
        }

        // Non-empty here, so first/last exist.
        if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
            if first.timestamp < request.start {
                return Err(DataError::Validation(
                    "data begins before request start; potential leakage".into(),
                ));
            }
            if last.timestamp > request.end {
                return Err(DataError::Validation(
                    "data extends beyond request end; potential lookahead".into(),
                ));
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(day: u32, close: f64) -> PriceRow {
        PriceRow {
            timestamp: Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    fn request() -> DataRequest {
        DataRequest::daily(
            "AAPL",
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 31, 0, 0, 0).unwrap(),
        )
    }

    fn message(result: Result<Vec<PriceRow>, DataError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn sorts_unordered_rows() {
        let rows = DataValidator
            .validate(vec![row(3, 3.0), row(2, 2.0)], &request())
            .unwrap();
        assert_eq!(rows[0].close, 2.0);
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert!(message(DataValidator.validate(vec![], &request())).contains("empty"));
        assert!(
            message(DataValidator.validate(vec![row(2, 1.0), row(2, 1.0)], &request()))
                .contains("duplicate")
        );
    }

    #[test]
    fn rejects_nan() {
        let mut bad = row(2, 1.0);
        bad.volume = f64::NAN;
        assert!(message(DataValidator.validate(vec![bad], &request())).contains("NaN"));
    }

    #[test]
    fn rejects_out_of_range() {
        let mut req = request();
        req.start = Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap();
        assert!(message(DataValidator.validate(vec![row(2, 1.0)], &req)).contains("leakage"));

        let mut req = request();
        req.end = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        assert!(message(DataValidator.validate(vec![row(3, 1.0)], &req)).contains("lookahead"));
    }
}
