//! Parameter sweeps with independent legs.
//!
//! Unlike grid-search mode in [`BacktestRunner`], where every leg trades the
//! same ledger, each sweep leg gets a fresh strategy, ledger and runner. Legs
//! run in parallel on the rayon pool and are returned in grid order.

use rayon::prelude::*;

use quantbt_core::domain::{MarketEvent, RunId};
use quantbt_core::engine::{EngineMode, EngineResult};
use quantbt_core::execution::{ExecutionConfig, SimulatedExecution};
use quantbt_core::rng::RngHierarchy;
use quantbt_core::strategy::{ParamMap, StrategyHost, StrategyRegistry, StrategySettings};

use crate::config::{ConfigError, RunConfig};
use crate::metrics::{summarize, MetricsSummary};
use crate::runner::{BacktestRunner, BacktestSettings, RunError};

/// Outcome of one sweep leg.
#[derive(Debug, Clone)]
pub struct SweepLeg {
    /// 1-based position in the grid.
    pub index: usize,
    pub parameters: ParamMap,
    pub result: EngineResult,
    pub summary: MetricsSummary,
}

#[derive(Debug, Clone)]
pub struct ParamSweep {
    registry: StrategyRegistry,
    strategy: String,
    base_params: ParamMap,
    strategy_settings: StrategySettings,
    execution: ExecutionConfig,
    settings: BacktestSettings,
}

impl ParamSweep {
    pub fn new(
        registry: StrategyRegistry,
        strategy: impl Into<String>,
        base_params: ParamMap,
        strategy_settings: StrategySettings,
        execution: ExecutionConfig,
        settings: BacktestSettings,
    ) -> Self {
        Self {
            registry,
            strategy: strategy.into(),
            base_params,
            strategy_settings,
            execution,
            settings,
        }
    }

    pub fn from_config(config: &RunConfig, registry: StrategyRegistry) -> Result<Self, ConfigError> {
        Ok(Self::new(
            registry,
            config.strategy.name.clone(),
            config.strategy.params.clone(),
            config.strategy.settings.clone(),
            config.execution.clone(),
            config.backtest_settings()?,
        ))
    }

    /// Run id of leg `index` (1-based).
    pub fn leg_run_id(&self, index: usize) -> String {
        format!("{}-leg-{index}", self.settings.run_id)
    }

    /// Run every parameter set over the full event sequence.
    pub fn run(&self, events: &[MarketEvent], grid: &[ParamMap]) -> Vec<Result<SweepLeg, RunError>> {
        tracing::info!(legs = grid.len(), strategy = %self.strategy, "starting sweep");
        grid.par_iter()
            .enumerate()
            .map(|(i, params)| self.run_leg(i + 1, params, events))
            .collect()
    }

    fn run_leg(
        &self,
        index: usize,
        params: &ParamMap,
        events: &[MarketEvent],
    ) -> Result<SweepLeg, RunError> {
        let run_id = self.leg_run_id(index);
        let seed = RngHierarchy::new(self.settings.deterministic_seed).sub_seed(
            &RunId::new(self.settings.run_id.clone()),
            &run_id,
            0,
        );

        let strategy = self.registry.create(&self.strategy, &self.base_params)?;
        let mut host = StrategyHost::new(strategy, self.strategy_settings.clone())?;
        host.apply_parameters(params)?;

        let settings = BacktestSettings {
            run_id,
            deterministic_seed: seed,
            mode: EngineMode::Standard,
            grid_parameters: Vec::new(),
            enable_progress: false,
            ..self.settings.clone()
        };
        let execution = SimulatedExecution::new(self.execution.clone())?;
        let mut runner = BacktestRunner::with_execution(host, settings, Box::new(execution))?;
        let mut result = runner.run(events)?;
        for segment in &mut result.segments {
            segment.parameters = params.clone();
        }
        let summary = summarize(&result);
        Ok(SweepLeg {
            index,
            parameters: params.clone(),
            result,
            summary,
        })
    }
}

/// The leg with the highest Sharpe ratio among successful legs.
pub fn best_by_sharpe(legs: &[SweepLeg]) -> Option<&SweepLeg> {
    legs.iter()
        .filter(|leg| leg.summary.sharpe.is_finite())
        .max_by(|a, b| a.summary.sharpe.total_cmp(&b.summary.sharpe))
}
