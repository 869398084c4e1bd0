//! Strategy plug-in contract.
//!
//! A plug-in implements the signal logic only. Lifecycle rules (context
//! attachment, timestamp monotonicity, subscriptions, warm-up gating,
//! throttling, strength clamping, id defaults) live in
//! [`StrategyHost`](super::host::StrategyHost) and apply to every plug-in
//! uniformly.

use super::context::StrategyContext;
use super::params::{ParamError, ParamMap};
use crate::domain::{MarketEvent, SignalEvent};
use crate::portfolio::PortfolioLedger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("strategy '{strategy}' has no context attached")]
    ContextMissing { strategy: String },

    #[error(
        "strategy '{strategy}' received non-monotonic market event: {current} after {previous}"
    )]
    NonMonotonic {
        strategy: String,
        previous: f64,
        current: f64,
    },

    #[error("invalid strategy settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Parameter(#[from] ParamError),

    #[error("strategy '{strategy}' failed: {message}")]
    Failed { strategy: String, message: String },
}

/// Signal-generation plug-in.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Produce raw signals for one market event. The host clamps, throttles
    /// and stamps them afterwards.
    fn generate_signals(
        &mut self,
        event: &MarketEvent,
        ctx: &mut StrategyContext,
        portfolio: &PortfolioLedger,
    ) -> Result<Vec<SignalEvent>, StrategyError>;

    /// Minimum number of events consumed before signals are emitted.
    fn warmup_bars(&self) -> usize {
        0
    }

    /// Called instead of `generate_signals` while warming up.
    fn on_warmup(&mut self, _event: &MarketEvent, _ctx: &mut StrategyContext) {}

    /// Called at the start of every segment after the host resets its state.
    fn on_segment_start(&mut self, _segment_id: &str, _metadata: &BTreeMap<String, String>) {}

    /// Apply parameter overrides. The default accepts only an empty map.
    fn apply_parameters(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        match params.keys().next() {
            Some(key) => Err(ParamError::unknown(self.name(), key)),
            None => Ok(()),
        }
    }
}

/// Host-level lifecycle settings shared by every plug-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub warmup_bars: usize,
    pub max_signal_strength: f64,
    /// Minimum seconds between two emitted signals for the same symbol.
    pub min_signal_interval: f64,
    /// Symbol allow-list; empty means every symbol.
    pub subscriptions: Vec<String>,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            warmup_bars: 0,
            max_signal_strength: 1.0,
            min_signal_interval: 0.0,
            subscriptions: Vec::new(),
        }
    }
}

impl StrategySettings {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.max_signal_strength.is_nan() || self.max_signal_strength <= 0.0 {
            return Err(StrategyError::InvalidSettings(format!(
                "max_signal_strength must be positive, got {}",
                self.max_signal_strength
            )));
        }
        if self.min_signal_interval.is_nan() || self.min_signal_interval < 0.0 {
            return Err(StrategyError::InvalidSettings(format!(
                "min_signal_interval cannot be negative, got {}",
                self.min_signal_interval
            )));
        }
        Ok(())
    }
}
