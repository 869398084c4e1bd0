//! Run metadata persisted at `<output_dir>/<run_id>/metadata.json`.
//!
//! Rewritten after every segment while checkpointing, and once more when the
//! run completes or crashes.

use chrono::Utc;
use quantbt_core::domain::RunId;
use quantbt_core::engine::{EngineMode, EngineResult, EngineSegmentResult, RunStatus};
use quantbt_core::portfolio::PortfolioSnapshot;
use quantbt_core::strategy::ParamMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("metadata JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub segment_id: String,
    #[serde(default)]
    pub fill_count: usize,
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default)]
    pub parameters: ParamMap,
    #[serde(default)]
    pub portfolio: PortfolioSnapshot,
}

impl From<&EngineSegmentResult> for SegmentRecord {
    fn from(segment: &EngineSegmentResult) -> Self {
        Self {
            segment_id: segment.segment_id.clone(),
            fill_count: segment.fill_count,
            duration_ms: segment.duration_ms,
            parameters: segment.parameters.clone(),
            portfolio: segment.portfolio.clone(),
        }
    }
}

fn completed() -> RunStatus {
    RunStatus::Completed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    #[serde(default)]
    pub mode: EngineMode,
    #[serde(default = "completed")]
    pub status: RunStatus,
    #[serde(default)]
    pub segments: Vec<SegmentRecord>,
    /// Seconds since the Unix epoch at write time.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunMetadata {
    pub fn new(
        run_id: &str,
        mode: EngineMode,
        status: RunStatus,
        segments: &[EngineSegmentResult],
        error: Option<String>,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            mode,
            status,
            segments: segments.iter().map(SegmentRecord::from).collect(),
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            error,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), MetadataError> {
        let io = |source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).map_err(io)
    }

    pub fn read(path: &Path) -> Result<Self, MetadataError> {
        let bytes = fs::read(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Rebuild an engine result. Fills are not persisted, so every segment
    /// comes back with an empty fill list.
    pub fn into_engine_result(self, metadata_path: &Path) -> EngineResult {
        EngineResult {
            run_id: RunId::new(self.run_id),
            mode: self.mode,
            segments: self
                .segments
                .into_iter()
                .map(|s| EngineSegmentResult {
                    segment_id: s.segment_id,
                    fills: Vec::new(),
                    portfolio: s.portfolio,
                    parameters: s.parameters,
                    duration_ms: s.duration_ms,
                    fill_count: s.fill_count,
                })
                .collect(),
            metadata_path: Some(metadata_path.to_path_buf()),
            status: self.status,
        }
    }
}
