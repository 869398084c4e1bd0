//! Run modes, segment plans and result records.

use crate::domain::{FillEvent, MarketEvent, RunId};
use crate::portfolio::PortfolioSnapshot;
use crate::strategy::ParamMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    #[default]
    Standard,
    WalkForward,
    GridSearch,
}

impl EngineMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineMode::Standard => "standard",
            EngineMode::WalkForward => "walk_forward",
            EngineMode::GridSearch => "grid_search",
        }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work: a borrowed slice of the input plus overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan<'a> {
    pub segment_id: String,
    pub events: &'a [MarketEvent],
    pub parameters: ParamMap,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
    Crashed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Crashed => "crashed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSegmentResult {
    pub segment_id: String,
    pub fills: Vec<FillEvent>,
    pub portfolio: PortfolioSnapshot,
    pub parameters: ParamMap,
    pub duration_ms: f64,
    pub fill_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    pub run_id: RunId,
    pub mode: EngineMode,
    pub segments: Vec<EngineSegmentResult>,
    pub metadata_path: Option<PathBuf>,
    pub status: RunStatus,
}

impl EngineResult {
    /// Every fill of the run, in segment order.
    pub fn fills(&self) -> impl Iterator<Item = &FillEvent> {
        self.segments.iter().flat_map(|s| s.fills.iter())
    }

    pub fn fill_count(&self) -> usize {
        self.segments.iter().map(|s| s.fill_count).sum()
    }

    /// Snapshot of the last segment, i.e. the final ledger state.
    pub fn final_snapshot(&self) -> Option<&PortfolioSnapshot> {
        self.segments.last().map(|s| &s.portfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_and_status_strings() {
        assert_eq!(EngineMode::WalkForward.to_string(), "walk_forward");
        assert_eq!(
            serde_json::to_string(&EngineMode::GridSearch).unwrap(),
            "\"grid_search\""
        );
        assert_eq!(RunStatus::Crashed.to_string(), "crashed");
        assert_eq!(
            serde_json::from_str::<RunStatus>("\"in_progress\"").unwrap(),
            RunStatus::InProgress
        );
    }
}
