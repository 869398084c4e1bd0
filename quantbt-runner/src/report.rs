//! Metrics report artifacts: `metrics.json` and `metrics.md`.

use crate::metadata::{MetadataError, RunMetadata};
use crate::metrics::{summarize, MetricsSummary};
use quantbt_core::engine::EngineResult;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_dir(dir: &Path) -> Result<(), ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub segment_id: String,
    pub fill_count: usize,
    pub duration_ms: f64,
    /// Parameter overrides as compact JSON.
    pub parameters: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub summary: MetricsSummary,
    pub segments: Vec<SegmentMetrics>,
}

impl MetricsReport {
    pub fn from_result(result: &EngineResult) -> Result<Self, ReportError> {
        let segments = result
            .segments
            .iter()
            .map(|s| {
                Ok(SegmentMetrics {
                    segment_id: s.segment_id.clone(),
                    fill_count: s.fill_count,
                    duration_ms: s.duration_ms,
                    parameters: serde_json::to_string(&s.parameters)?,
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;
        Ok(Self {
            summary: summarize(result),
            segments,
        })
    }

    pub fn summary_table(&self) -> String {
        let mut out = String::from("| Metric | Value |\n|---|---|\n");
        let rows: Vec<String> = self
            .summary
            .rows()
            .into_iter()
            .map(|(k, v)| format!("| {k} | {v} |"))
            .collect();
        out.push_str(&rows.join("\n"));
        out
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Metrics Summary\n");
        md.push_str(&self.summary_table());
        md.push_str("\n\n## Segments");
        for seg in &self.segments {
            let _ = write!(
                md,
                "\n- `{}`: fills={} duration={:.2} ms params={}",
                seg.segment_id, seg.fill_count, seg.duration_ms, seg.parameters
            );
        }
        md
    }

    /// Write `metrics.json` and `metrics.md` into `dir`.
    pub fn write(&self, dir: &Path) -> Result<(), ReportError> {
        create_dir(dir)?;
        write_file(&dir.join("metrics.json"), &serde_json::to_vec_pretty(self)?)?;
        write_file(&dir.join("metrics.md"), self.to_markdown().as_bytes())?;
        Ok(())
    }
}

/// Build the report for `result` and persist it under `output_dir`.
pub fn build_metrics_report(
    result: &EngineResult,
    output_dir: &Path,
) -> Result<MetricsReport, ReportError> {
    let report = MetricsReport::from_result(result)?;
    report.write(output_dir)?;
    tracing::debug!(dir = %output_dir.display(), "metrics report written");
    Ok(report)
}

/// Recompute the summary from a persisted `metadata.json`.
///
/// The summary is written to `metrics.json` in `output_dir`, or next to the
/// metadata file when no directory is given.
pub fn analyze_metadata(
    metadata_path: &Path,
    output_dir: Option<&Path>,
) -> Result<MetricsSummary, ReportError> {
    let metadata = RunMetadata::read(metadata_path)?;
    let result = metadata.into_engine_result(metadata_path);
    let summary = summarize(&result);

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => metadata_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    create_dir(&dir)?;
    write_file(&dir.join("metrics.json"), &serde_json::to_vec_pretty(&summary)?)?;
    Ok(summary)
}
