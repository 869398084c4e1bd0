//! Performance metrics — pure functions over per-segment returns.
//!
//! A run has one return per segment, derived from the segment's closing
//! ledger snapshot. Ratios annualize with 252 periods per year.

use quantbt_core::engine::EngineResult;
use quantbt_core::portfolio::PortfolioSnapshot;
use serde::{Deserialize, Serialize};

pub const PERIODS_PER_YEAR: u32 = 252;

/// Summary written to `metrics.json` and printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub cumulative_return: f64,
    pub average_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub segments: usize,
}

impl MetricsSummary {
    /// `(name, value)` pairs in report order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cumulative_return", self.cumulative_return.to_string()),
            ("average_return", self.average_return.to_string()),
            ("annualized_return", self.annualized_return.to_string()),
            ("max_drawdown", self.max_drawdown.to_string()),
            ("sharpe", self.sharpe.to_string()),
            ("sortino", self.sortino.to_string()),
            ("segments", self.segments.to_string()),
        ]
    }
}

/// Basic statistics of a return series.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub returns: Vec<f64>,
    pub cumulative_return: f64,
    pub average_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
}

pub fn summarize(result: &EngineResult) -> MetricsSummary {
    let snapshots: Vec<&PortfolioSnapshot> = result.segments.iter().map(|s| &s.portfolio).collect();
    let returns = derive_returns(&snapshots);
    let report = compute_basic_metrics(&returns);
    MetricsSummary {
        cumulative_return: report.cumulative_return,
        average_return: report.average_return,
        annualized_return: report.annualized_return,
        max_drawdown: report.max_drawdown,
        sharpe: sharpe_ratio(&returns, 0.0, PERIODS_PER_YEAR),
        sortino: sortino_ratio(&returns, 0.0, PERIODS_PER_YEAR),
        segments: result.segments.len(),
    }
}

/// One return per segment snapshot.
///
/// The first is `(equity - cash) / cash` (cash of zero counts as one). Each
/// later one is `equity / (previous_return + 1) - 1`. No snapshots yields
/// `[0.0]`.
pub fn derive_returns(snapshots: &[&PortfolioSnapshot]) -> Vec<f64> {
    let mut returns: Vec<f64> = Vec::with_capacity(snapshots.len());
    for snap in snapshots {
        let equity = snap.get("equity").copied().unwrap_or(0.0);
        let cash = snap.get("cash").copied().unwrap_or(0.0);
        let ret = match returns.last() {
            None => {
                let base = if cash == 0.0 { 1.0 } else { cash };
                (equity - cash) / base
            }
            Some(prev) => equity / (prev + 1.0) - 1.0,
        };
        returns.push(ret);
    }
    if returns.is_empty() {
        returns.push(0.0);
    }
    returns
}

pub fn compute_basic_metrics(returns: &[f64]) -> PerformanceReport {
    let cumulative = to_cumulative_returns(returns);
    let average = mean(returns);
    PerformanceReport {
        returns: returns.to_vec(),
        cumulative_return: cumulative.last().copied().unwrap_or(0.0),
        average_return: average,
        annualized_return: annualized_return(average, PERIODS_PER_YEAR),
        max_drawdown: max_drawdown(returns),
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compounded return after each period.
pub fn to_cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut prod = 1.0;
    returns
        .iter()
        .map(|r| {
            prod *= 1.0 + r;
            prod - 1.0
        })
        .collect()
}

pub fn rolling_max(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            peak
        })
        .collect()
}

/// Largest peak-to-trough drop of the cumulative return curve, as a
/// positive number.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let cumulative = to_cumulative_returns(returns);
    let peaks = rolling_max(&cumulative);
    cumulative
        .iter()
        .zip(&peaks)
        .map(|(c, p)| c - p)
        .fold(0.0_f64, f64::min)
        .abs()
}

/// `(1 + avg)^periods - 1`, or `-1.0` when `1 + avg <= 0`.
pub fn annualized_return(average_return: f64, periods_per_year: u32) -> f64 {
    let base = 1.0 + average_return;
    if base <= 0.0 {
        return -1.0;
    }
    base.powf(periods_per_year as f64) - 1.0
}

/// Annualized Sharpe ratio with population standard deviation.
///
/// Returns 0.0 for an empty series or zero volatility.
pub fn sharpe_ratio(returns: &[f64], risk_free: f64, periods_per_year: u32) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let periods = periods_per_year as f64;
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free / periods).collect();
    let m = mean(&excess);
    let variance = excess.iter().map(|r| (r - m).powi(2)).sum::<f64>() / excess.len() as f64;
    let std = variance.sqrt();
    if std == 0.0 {
        return 0.0;
    }
    (m * periods) / (std * periods.sqrt())
}

/// Annualized Sortino ratio. Downside deviation is taken over every period,
/// with non-negative returns counted as zero.
pub fn sortino_ratio(returns: &[f64], risk_free: f64, periods_per_year: u32) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let periods = periods_per_year as f64;
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free / periods).collect();
    let downside_variance =
        excess.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / excess.len() as f64;
    let downside_std = downside_variance.sqrt();
    if downside_std == 0.0 {
        return 0.0;
    }
    (mean(&excess) * periods) / (downside_std * periods.sqrt())
}
