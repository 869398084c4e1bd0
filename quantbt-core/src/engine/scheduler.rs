//! Run scheduler — splits the input into segment plans per mode.
//!
//! - **standard**: one segment `segment-1` over everything.
//! - **walk_forward**: contiguous windows `wf-1..`, the last possibly short.
//! - **grid_search**: one segment `grid-1..` per parameter set, each over the
//!   full sequence.

use super::modes::{EngineMode, SegmentPlan};
use crate::domain::MarketEvent;
use crate::strategy::ParamMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub mode: EngineMode,
    /// Events per walk-forward window; 0 picks `max(1, n / 5)`.
    pub walk_forward_window: usize,
    /// Parameter sets for grid search; empty means one leg with no overrides.
    pub grid: Vec<ParamMap>,
}

#[derive(Debug, Clone, Default)]
pub struct RunScheduler {
    config: SchedulerConfig,
}

impl RunScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Plan segments. Empty input yields an empty plan.
    pub fn plan<'a>(&self, events: &'a [MarketEvent]) -> Vec<SegmentPlan<'a>> {
        if events.is_empty() {
            return Vec::new();
        }
        match self.config.mode {
            EngineMode::Standard => vec![SegmentPlan {
                segment_id: "segment-1".to_string(),
                events,
                parameters: ParamMap::new(),
                metadata: BTreeMap::new(),
            }],
            EngineMode::WalkForward => self.walk_forward(events),
            EngineMode::GridSearch => self.grid(events),
        }
    }

    fn walk_forward<'a>(&self, events: &'a [MarketEvent]) -> Vec<SegmentPlan<'a>> {
        let window = match self.config.walk_forward_window {
            0 => (events.len() / 5).max(1),
            w => w,
        };
        events
            .chunks(window)
            .enumerate()
            .map(|(i, chunk)| {
                let start = i * window;
                let mut metadata = BTreeMap::new();
                metadata.insert("window_start_index".to_string(), start.to_string());
                metadata.insert(
                    "window_end_index".to_string(),
                    (start + chunk.len() - 1).to_string(),
                );
                SegmentPlan {
                    segment_id: format!("wf-{}", i + 1),
                    events: chunk,
                    parameters: ParamMap::new(),
                    metadata,
                }
            })
            .collect()
    }

    fn grid<'a>(&self, events: &'a [MarketEvent]) -> Vec<SegmentPlan<'a>> {
        let default_grid = [ParamMap::new()];
        let grid: &[ParamMap] = if self.config.grid.is_empty() {
            &default_grid
        } else {
            &self.config.grid
        };
        grid.iter()
            .enumerate()
            .map(|(i, params)| {
                let mut metadata = BTreeMap::new();
                metadata.insert("grid_index".to_string(), (i + 1).to_string());
                SegmentPlan {
                    segment_id: format!("grid-{}", i + 1),
                    events,
                    parameters: params.clone(),
                    metadata,
                }
            })
            .collect()
    }
}
