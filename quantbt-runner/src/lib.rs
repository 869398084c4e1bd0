//! quantbt runner — run orchestration on top of `quantbt-core`.
//!
//! This crate provides:
//! - `BacktestRunner`: multi-segment runs over one shared ledger with crash
//!   recording and checkpointed metadata
//! - Run metadata persistence (`metadata.json`)
//! - Metrics (returns, Sharpe, Sortino, drawdown) and report artifacts
//! - TOML run configuration
//! - Parameter sweeps with independent legs

pub mod config;
pub mod metadata;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, DataSection, RunConfig, RunSection, StrategySection};
pub use metadata::{MetadataError, RunMetadata, SegmentRecord};
pub use metrics::{summarize, MetricsSummary, PerformanceReport};
pub use report::{analyze_metadata, build_metrics_report, MetricsReport, ReportError};
pub use runner::{BacktestRunner, BacktestSettings, RunError};
pub use sweep::{best_by_sharpe, ParamSweep, SweepLeg};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn sweep_types_cross_threads() {
        assert_send::<ParamSweep>();
        assert_sync::<ParamSweep>();
        assert_send::<SweepLeg>();
        assert_send::<RunError>();
        assert_send::<MetricsSummary>();
        assert_sync::<MetricsSummary>();
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }
}
