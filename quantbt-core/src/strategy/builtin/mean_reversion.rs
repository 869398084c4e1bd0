//! Mean reversion — fade moves away from a rolling mean.
//!
//! The z-score of the latest price is computed against the SMA and
//! population standard deviation of the last `lookback` prices. When
//! `|z| >= z_threshold` the strategy signals against the move (SHORT above
//! the mean, LONG below) with strength `min(1, |z| / z_threshold) * weight`.
//! A flat window (zero deviation) never signals.

use super::momentum::upper_keys;
use super::push_bounded;
use crate::domain::{MarketEvent, SignalDirection, SignalEvent};
use crate::portfolio::PortfolioLedger;
use crate::strategy::context::StrategyContext;
use crate::strategy::contract::{Strategy, StrategyError};
use crate::strategy::indicators::{population_std, simple_moving_average};
use crate::strategy::params::{ParamError, ParamMap};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
pub struct MeanReversion {
    lookback: usize,
    z_threshold: f64,
    weights: BTreeMap<String, f64>,
    history: BTreeMap<String, VecDeque<f64>>,
}

impl MeanReversion {
    pub const NAME: &'static str = "mean-reversion";

    pub fn new(lookback: usize, z_threshold: f64) -> Result<Self, ParamError> {
        let mut s = Self::default();
        s.set_lookback(lookback)?;
        s.set_z_threshold(z_threshold)?;
        Ok(s)
    }

    pub fn with_weights(mut self, weights: BTreeMap<String, f64>) -> Self {
        self.weights = upper_keys(weights);
        self
    }

    fn set_lookback(&mut self, lookback: usize) -> Result<(), ParamError> {
        if lookback < 2 {
            return Err(ParamError::out_of_range("lookback", "must be at least 2"));
        }
        self.lookback = lookback;
        Ok(())
    }

    fn set_z_threshold(&mut self, z: f64) -> Result<(), ParamError> {
        if !(z.is_finite() && z > 0.0) {
            return Err(ParamError::out_of_range("z_threshold", "must be positive"));
        }
        self.z_threshold = z;
        Ok(())
    }

    fn record(&mut self, symbol: &str, price: f64) -> Vec<f64> {
        let window = self.history.entry(symbol.to_uppercase()).or_default();
        push_bounded(window, price, self.lookback);
        window.iter().copied().collect()
    }
}

impl Default for MeanReversion {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert("AAPL".to_string(), 1.0);
        Self {
            lookback: 10,
            z_threshold: 1.0,
            weights,
            history: BTreeMap::new(),
        }
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn warmup_bars(&self) -> usize {
        self.lookback
    }

    fn on_warmup(&mut self, event: &MarketEvent, _ctx: &mut StrategyContext) {
        self.record(&event.symbol, event.price);
    }

    fn on_segment_start(&mut self, _segment_id: &str, _metadata: &BTreeMap<String, String>) {
        self.history.clear();
    }

    fn generate_signals(
        &mut self,
        event: &MarketEvent,
        _ctx: &mut StrategyContext,
        _portfolio: &PortfolioLedger,
    ) -> Result<Vec<SignalEvent>, StrategyError> {
        let series = self.record(&event.symbol, event.price);
        if series.len() < self.lookback {
            return Ok(Vec::new());
        }
        let mean = simple_moving_average(&series, self.lookback);
        let std = population_std(&series);
        if std == 0.0 {
            return Ok(Vec::new());
        }
        let z = (event.price - mean) / std;
        if z.abs() < self.z_threshold {
            return Ok(Vec::new());
        }

        let direction = if z > 0.0 {
            SignalDirection::Short
        } else {
            SignalDirection::Long
        };
        let weight = self
            .weights
            .get(&event.symbol.to_uppercase())
            .copied()
            .unwrap_or(1.0);
        let strength = (z.abs() / self.z_threshold).min(1.0) * weight;

        Ok(vec![SignalEvent::new(event.symbol.clone(), strength, direction)
            .with_id(format!("{}-{}", Self::NAME, event.timestamp))
            .at(event.timestamp)])
    }

    fn apply_parameters(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        for (key, value) in params {
            match key.as_str() {
                "lookback" => self.set_lookback(value.as_usize(key)?)?,
                "z_threshold" => self.set_z_threshold(value.as_f64(key)?)?,
                "weights" => self.weights = upper_keys(value.as_weights(key)?.clone()),
                _ => return Err(ParamError::unknown(Self::NAME, key)),
            }
        }
        Ok(())
    }
}
