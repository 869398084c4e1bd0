//! Momentum — trade in the direction of the move over a rolling window.
//!
//! `momentum = last / first - 1` over the last `lookback` prices of a symbol.
//! A signal fires when `|momentum| >= threshold`, LONG for a rise and SHORT
//! for a fall, with strength `min(1, |momentum| / threshold) * weight`.

use super::push_bounded;
use crate::domain::{MarketEvent, SignalDirection, SignalEvent};
use crate::portfolio::PortfolioLedger;
use crate::strategy::context::StrategyContext;
use crate::strategy::contract::{Strategy, StrategyError};
use crate::strategy::params::{ParamError, ParamMap};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
pub struct Momentum {
    lookback: usize,
    threshold: f64,
    /// Upper-cased symbol → weight. Symbols not listed weigh 1.0.
    weights: BTreeMap<String, f64>,
    history: BTreeMap<String, VecDeque<f64>>,
}

impl Momentum {
    pub const NAME: &'static str = "momentum";

    pub fn new(lookback: usize, threshold: f64) -> Result<Self, ParamError> {
        let mut s = Self::default();
        s.set_lookback(lookback)?;
        s.set_threshold(threshold)?;
        Ok(s)
    }

    pub fn with_weights(mut self, weights: BTreeMap<String, f64>) -> Self {
        self.weights = upper_keys(weights);
        self
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn set_lookback(&mut self, lookback: usize) -> Result<(), ParamError> {
        if lookback == 0 {
            return Err(ParamError::out_of_range("lookback", "must be at least 1"));
        }
        self.lookback = lookback;
        Ok(())
    }

    fn set_threshold(&mut self, threshold: f64) -> Result<(), ParamError> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(ParamError::out_of_range("threshold", "must be positive"));
        }
        self.threshold = threshold;
        Ok(())
    }

    fn record(&mut self, symbol: &str, price: f64) -> &VecDeque<f64> {
        let window = self.history.entry(symbol.to_uppercase()).or_default();
        push_bounded(window, price, self.lookback);
        window
    }
}

impl Default for Momentum {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert("AAPL".to_string(), 1.0);
        Self {
            lookback: 5,
            threshold: 0.005,
            weights,
            history: BTreeMap::new(),
        }
    }
}

pub(crate) fn upper_keys(weights: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    weights
        .into_iter()
        .map(|(k, v)| (k.to_uppercase(), v))
        .collect()
}

impl Strategy for Momentum {
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
        let lookback = self.lookback;
        let window = self.record(&event.symbol, event.price);
        if window.len() < lookback {
            return Ok(Vec::new());
        }
        let (Some(&first), Some(&last)) = (window.front(), window.back()) else {
            return Ok(Vec::new());
        };
        if first == 0.0 {
            return Ok(Vec::new());
        }
        let momentum = last / first - 1.0;
        if momentum.abs() < self.threshold {
            return Ok(Vec::new());
        }

        let direction = if momentum > 0.0 {
            SignalDirection::Long
        } else {
            SignalDirection::Short
        };
        let weight = self
            .weights
            .get(&event.symbol.to_uppercase())
            .copied()
            .unwrap_or(1.0);
        let strength = (momentum.abs() / self.threshold).min(1.0) * weight;

        Ok(vec![SignalEvent::new(event.symbol.clone(), strength, direction)
            .with_id(format!("{}-{}", Self::NAME, event.timestamp))
            .at(event.timestamp)])
    }

    fn apply_parameters(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        for (key, value) in params {
            match key.as_str() {
                "lookback" => self.set_lookback(value.as_usize(key)?)?,
                "threshold" => self.set_threshold(value.as_f64(key)?)?,
                "weights" => self.weights = upper_keys(value.as_weights(key)?.clone()),
                _ => return Err(ParamError::unknown(Self::NAME, key)),
            }
        }
        Ok(())
    }
}
