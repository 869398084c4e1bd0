//! Local CSV provider for offline datasets and tests.
//!
//! Files are located with a pattern such as `synthetic_{symbol}.csv`; the
//! symbol is lower-cased and `{interval}` is substituted as well.

use super::frame;
use super::provider::{DataError, DataProvider, DataRequest, PriceRow};
use std::path::PathBuf;

pub const DEFAULT_PATTERN: &str = "synthetic_{symbol}.csv";

#[derive(Debug, Clone)]
pub struct LocalCsvProvider {
    data_dir: PathBuf,
    pattern: String,
}

impl LocalCsvProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_pattern(data_dir, DEFAULT_PATTERN)
    }

    pub fn with_pattern(data_dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pattern: pattern.into(),
        }
    }

    pub fn path_for(&self, request: &DataRequest) -> PathBuf {
        let filename = self
            .pattern
            .replace("{symbol}", &request.symbol.to_lowercase())
            .replace("{interval}", &request.interval);
        self.data_dir.join(filename)
    }
}

impl DataProvider for LocalCsvProvider {
    fn name(&self) -> &str {
        "local-csv"
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<PriceRow>, DataError> {
        let path = self.path_for(request);
        if !path.exists() {
            return Err(DataError::provider(
                self.name(),
                format!("local fixture missing: {}", path.display()),
            ));
        }
        let file = std::fs::File::open(&path)?;
        frame::read_rows(file)
    }
}
