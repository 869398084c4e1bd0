//! Static signal — emits a fixed per-symbol weight on every event.

use crate::domain::{MarketEvent, SignalDirection, SignalEvent};
use crate::portfolio::PortfolioLedger;
use crate::strategy::context::StrategyContext;
use crate::strategy::contract::{Strategy, StrategyError};
use crate::strategy::params::{ParamError, ParamMap};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct StaticSignal {
    pub weights: BTreeMap<String, f64>,
    pub direction: SignalDirection,
}

impl StaticSignal {
    pub const NAME: &'static str = "static-signal";

    pub fn new(weights: BTreeMap<String, f64>, direction: SignalDirection) -> Self {
        Self { weights, direction }
    }
}

impl Default for StaticSignal {
    fn default() -> Self {
        Self::new(BTreeMap::new(), SignalDirection::Long)
    }
}

/// Parse `LONG`/`SHORT` case-insensitively.
pub(crate) fn parse_direction(key: &str, text: &str) -> Result<SignalDirection, ParamError> {
    match text.to_ascii_uppercase().as_str() {
        "LONG" => Ok(SignalDirection::Long),
        "SHORT" => Ok(SignalDirection::Short),
        other => Err(ParamError::out_of_range(
            key,
            format!("expected LONG or SHORT, got '{other}'"),
        )),
    }
}

impl Strategy for StaticSignal {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate_signals(
        &mut self,
        event: &MarketEvent,
        _ctx: &mut StrategyContext,
        _portfolio: &PortfolioLedger,
    ) -> Result<Vec<SignalEvent>, StrategyError> {
        let weight = self.weights.get(&event.symbol).copied().unwrap_or(0.0);
        if weight == 0.0 {
            return Ok(Vec::new());
        }
        Ok(vec![
            SignalEvent::new(event.symbol.clone(), weight, self.direction).at(event.timestamp)
        ])
    }

    fn apply_parameters(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        for (key, value) in params {
            match key.as_str() {
                "weights" => self.weights = value.as_weights(key)?.clone(),
                "direction" => self.direction = parse_direction(key, value.as_text(key)?)?,
                _ => return Err(ParamError::unknown(Self::NAME, key)),
            }
        }
        Ok(())
    }
}
