//! On-disk cache of validated frames.
//!
//! Layout: `{root}/frames/{key}.csv` for price frames and `{root}/{key}.json`
//! for arbitrary JSON payloads. Slashes in keys are replaced with `_`.

use super::frame;
use super::provider::{DataError, PriceRow};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalDataCache {
    root: PathBuf,
    frames_dir: PathBuf,
}

impl LocalDataCache {
    /// Open (and create) a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DataError> {
        let root = root.into();
        let frames_dir = root.join("frames");
        fs::create_dir_all(&frames_dir)?;
        Ok(Self { root, frames_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn safe_key(key: &str) -> Result<String, DataError> {
        if key.is_empty() {
            return Err(DataError::Cache("cache key must be non-empty".into()));
        }
        Ok(key.replace('/', "_"))
    }

    fn frame_path(&self, key: &str) -> Result<PathBuf, DataError> {
        Ok(self.frames_dir.join(format!("{}.csv", Self::safe_key(key)?)))
    }

    fn payload_path(&self, key: &str) -> Result<PathBuf, DataError> {
        Ok(self.root.join(format!("{}.json", Self::safe_key(key)?)))
    }

    pub fn load_frame(&self, key: &str) -> Result<Option<Vec<PriceRow>>, DataError> {
        let path = self.frame_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let file = fs::File::open(&path)?;
        frame::read_rows(file).map(Some)
    }

    /// Write atomically: write `.tmp`, then rename into place.
    pub fn store_frame(&self, key: &str, rows: &[PriceRow]) -> Result<(), DataError> {
        let path = self.frame_path(key)?;
        let tmp = path.with_extension("csv.tmp");
        {
            let file = fs::File::create(&tmp)?;
            frame::write_rows(rows, file)?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<serde_json::Value>, DataError> {
        let path = self.payload_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| DataError::Cache(format!("corrupt payload {}: {e}", path.display())))
    }

    pub fn set(&self, key: &str, payload: &serde_json::Value) -> Result<(), DataError> {
        let path = self.payload_path(key)?;
        let text = serde_json::to_string(payload)
            .map_err(|e| DataError::Cache(format!("serialize payload: {e}")))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Remove every cached frame and payload.
    pub fn clear(&self) -> Result<(), DataError> {
        for (dir, ext) in [(&self.root, "json"), (&self.frames_dir, "csv")] {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_file() && path.extension().is_some_and(|e| e == ext) {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rows() -> Vec<PriceRow> {
        vec![PriceRow {
            timestamp: Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
        }]
    }

    #[test]
    fn frame_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDataCache::new(dir.path()).unwrap();
        assert!(cache.load_frame("AAPL_1d").unwrap().is_none());
        cache.store_frame("AAPL_1d", &rows()).unwrap();
        assert!(dir.path().join("frames").join("AAPL_1d.csv").exists());
        assert_eq!(cache.load_frame("AAPL_1d").unwrap(), Some(rows()));
        cache.clear().unwrap();
        assert!(cache.load_frame("AAPL_1d").unwrap().is_none());
    }

    #[test]
    fn json_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDataCache::new(dir.path()).unwrap();
        let payload = serde_json::json!({"rows": 3});
        cache.set("a/b", &payload).unwrap();
        assert!(dir.path().join("a_b.json").exists());
        assert_eq!(cache.get("a/b").unwrap(), Some(payload));
        assert!(cache.get("").is_err());
    }
}
