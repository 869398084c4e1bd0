//! Backtest runner — drives every planned segment over one shared ledger.
//!
//! `BacktestRunner::run` plans segments, prepares the strategy host for each
//! one (context, parameter overrides, segment reset), runs the segment loop
//! and persists run metadata plus a metrics report under
//! `<output_dir>/<run_id>/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quantbt_core::domain::{MarketEvent, OrderIdGenerator, RunId};
use quantbt_core::engine::{
    run_segment, EngineMode, EngineResult, EngineSegmentResult, RunScheduler, RunStatus,
    SchedulerConfig, SegmentPlan,
};
use quantbt_core::execution::{
    ExecutionConfig, ExecutionError, ExecutionHandler, SimulatedExecution,
};
use quantbt_core::logging::RunLogger;
use quantbt_core::portfolio::{PortfolioLedger, PortfolioSnapshot};
use quantbt_core::strategy::{ParamMap, RegistryError, StrategyContext, StrategyError, StrategyHost};

use crate::metadata::{MetadataError, RunMetadata};
use crate::report::{build_metrics_report, ReportError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no market events supplied to the runner")]
    EmptyInput,
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("execution config error: {0}")]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Run-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub run_id: String,
    pub output_dir: PathBuf,
    pub deterministic_seed: u64,
    pub initial_cash: f64,
    pub base_currency: String,
    pub mode: EngineMode,
    /// Walk-forward window in events; 0 picks one fifth of the input.
    pub walk_forward_window: usize,
    pub grid_parameters: Vec<ParamMap>,
    /// Log one line per segment at info level.
    pub enable_progress: bool,
    /// Rewrite `metadata.json` with status `in_progress` after each segment.
    pub enable_checkpointing: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            run_id: "skeleton".to_string(),
            output_dir: PathBuf::from("artifacts"),
            deterministic_seed: 42,
            initial_cash: 1_000_000.0,
            base_currency: "USD".to_string(),
            mode: EngineMode::Standard,
            walk_forward_window: 0,
            grid_parameters: Vec::new(),
            enable_progress: true,
            enable_checkpointing: true,
        }
    }
}

impl BacktestSettings {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            mode: self.mode,
            walk_forward_window: self.walk_forward_window,
            grid: self.grid_parameters.clone(),
        }
    }
}

pub struct BacktestRunner {
    host: StrategyHost,
    settings: BacktestSettings,
    execution: Box<dyn ExecutionHandler>,
    output_dir: PathBuf,
    order_ids: OrderIdGenerator,
    ledger: Option<PortfolioLedger>,
    last_snapshot: Option<PortfolioSnapshot>,
}

impl std::fmt::Debug for BacktestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestRunner")
            .field("host", &self.host)
            .field("settings", &self.settings)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl BacktestRunner {
    /// Runner with the default simulated execution.
    pub fn new(host: StrategyHost, settings: BacktestSettings) -> Result<Self, RunError> {
        let execution = SimulatedExecution::new(ExecutionConfig::default())?;
        Self::with_execution(host, settings, Box::new(execution))
    }

    /// Runner with a custom execution handler. Creates the run's output
    /// directory.
    pub fn with_execution(
        host: StrategyHost,
        settings: BacktestSettings,
        execution: Box<dyn ExecutionHandler>,
    ) -> Result<Self, RunError> {
        let output_dir = settings.output_dir.join(&settings.run_id);
        std::fs::create_dir_all(&output_dir).map_err(|source| RunError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self {
            host,
            settings,
            execution,
            output_dir,
            order_ids: OrderIdGenerator::new(),
            ledger: None,
            last_snapshot: None,
        })
    }

    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    pub fn host(&self) -> &StrategyHost {
        &self.host
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join("metadata.json")
    }

    /// Ledger of the last completed run.
    pub fn ledger(&self) -> Option<&PortfolioLedger> {
        self.ledger.as_ref()
    }

    /// Final snapshot of the last completed run.
    pub fn last_snapshot(&self) -> Option<&PortfolioSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Run every planned segment in order.
    ///
    /// On failure the metadata is written with status `crashed` and the error
    /// message before the error is returned.
    pub fn run(&mut self, events: &[MarketEvent]) -> Result<EngineResult, RunError> {
        let scheduler = RunScheduler::new(self.settings.scheduler_config());
        let plans = scheduler.plan(events);
        if plans.is_empty() {
            return Err(RunError::EmptyInput);
        }

        let mode = self.settings.mode;
        let logger = RunLogger::new(&self.settings.run_id, mode.as_str());
        let metadata_path = self.metadata_path();
        let mut ledger =
            PortfolioLedger::with_cash(self.settings.base_currency.as_str(), self.settings.initial_cash);
        let mut segments: Vec<EngineSegmentResult> = Vec::with_capacity(plans.len());

        let outcome = logger.in_scope(|| {
            self.run_plans(&plans, &mut ledger, &mut segments, &logger, &metadata_path)
        });
        if let Err(err) = outcome {
            logger.in_scope(|| tracing::error!(error = %err, "run crashed"));
            let crashed = RunMetadata::new(
                &self.settings.run_id,
                mode,
                RunStatus::Crashed,
                &segments,
                Some(err.to_string()),
            );
            if let Err(write_err) = crashed.write(&metadata_path) {
                tracing::error!(error = %write_err, "failed to record crash metadata");
            }
            return Err(err);
        }

        self.last_snapshot = Some(ledger.snapshot());
        self.ledger = Some(ledger);
        RunMetadata::new(&self.settings.run_id, mode, RunStatus::Completed, &segments, None)
            .write(&metadata_path)?;

        let result = EngineResult {
            run_id: RunId::new(self.settings.run_id.clone()),
            mode,
            segments,
            metadata_path: Some(metadata_path),
            status: RunStatus::Completed,
        };
        build_metrics_report(&result, &self.output_dir)?;
        logger.in_scope(|| {
            tracing::info!(
                segments = result.segments.len(),
                fills = result.fill_count(),
                "run completed"
            )
        });
        Ok(result)
    }

    fn run_plans(
        &mut self,
        plans: &[SegmentPlan<'_>],
        ledger: &mut PortfolioLedger,
        segments: &mut Vec<EngineSegmentResult>,
        logger: &RunLogger,
        metadata_path: &Path,
    ) -> Result<(), RunError> {
        let total = plans.len();
        for (idx, plan) in plans.iter().enumerate() {
            if self.settings.enable_progress {
                tracing::info!(
                    segment = %plan.segment_id,
                    index = idx + 1,
                    total,
                    "running segment"
                );
            }
            self.prepare_segment(plan)?;
            let result = run_segment(
                plan,
                &mut self.host,
                self.execution.as_ref(),
                ledger,
                &mut self.order_ids,
                logger,
            )?;
            segments.push(result);

            if self.settings.enable_checkpointing {
                RunMetadata::new(
                    &self.settings.run_id,
                    self.settings.mode,
                    RunStatus::InProgress,
                    segments,
                    None,
                )
                .write(metadata_path)?;
            }
        }
        Ok(())
    }

    /// Fresh context (indicator cache, metadata, seeded random), then the
    /// plan's overrides, then the host's segment reset.
    fn prepare_segment(&mut self, plan: &SegmentPlan<'_>) -> Result<(), RunError> {
        let mut metadata = BTreeMap::from([
            ("run_id".to_string(), self.settings.run_id.clone()),
            ("segment_id".to_string(), plan.segment_id.clone()),
            ("mode".to_string(), self.settings.mode.as_str().to_string()),
        ]);
        metadata.extend(plan.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));

        let context = StrategyContext::new(self.host.name(), self.settings.deterministic_seed)
            .with_metadata(metadata.clone());
        self.host.attach_context(context);
        self.host.apply_parameters(&plan.parameters)?;
        self.host.initialize_segment(&plan.segment_id, &metadata);
        Ok(())
    }
}
