//! StrategyHost — owns a plug-in and enforces the strategy lifecycle.
//!
//! State machine per segment:
//! - **cold** while `processed <= warmup`: events feed `on_warmup`, nothing
//!   is emitted;
//! - **warm** afterwards: events feed `generate_signals`.
//!
//! `initialize_segment` returns the host to cold and clears throttle state.

use super::context::StrategyContext;
use super::contract::{Strategy, StrategyError, StrategySettings};
use super::params::{ParamMap, ParamValue};
use crate::domain::{MarketEvent, SignalEvent};
use crate::portfolio::PortfolioLedger;
use std::collections::{BTreeMap, BTreeSet};

const WARMUP_KEY: &str = "warmup_bars";
const MAX_STRENGTH_KEY: &str = "max_signal_strength";
const MIN_INTERVAL_KEY: &str = "min_signal_interval";

pub struct StrategyHost {
    strategy: Box<dyn Strategy>,
    settings: StrategySettings,
    subscriptions: BTreeSet<String>,
    context: Option<StrategyContext>,
    processed: usize,
    last_timestamp: Option<f64>,
    last_emission: BTreeMap<String, f64>,
}

impl std::fmt::Debug for StrategyHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyHost")
            .field("strategy", &self.strategy.name())
            .field("settings", &self.settings)
            .field("processed", &self.processed)
            .finish()
    }
}

impl StrategyHost {
    pub fn new(
        strategy: Box<dyn Strategy>,
        settings: StrategySettings,
    ) -> Result<Self, StrategyError> {
        settings.validate()?;
        let subscriptions = settings
            .subscriptions
            .iter()
            .map(|s| s.to_uppercase())
            .collect();
        Ok(Self {
            strategy,
            settings,
            subscriptions,
            context: None,
            processed: 0,
            last_timestamp: None,
            last_emission: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    pub fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    /// Effective warm-up: the larger of the host setting and the plug-in's
    /// own requirement.
    pub fn warmup_bars(&self) -> usize {
        self.settings.warmup_bars.max(self.strategy.warmup_bars())
    }

    pub fn processed_events(&self) -> usize {
        self.processed
    }

    pub fn is_warm(&self) -> bool {
        self.processed > self.warmup_bars()
    }

    pub fn attach_context(&mut self, context: StrategyContext) {
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&StrategyContext> {
        self.context.as_ref()
    }

    /// Add symbols to the allow-list (case-insensitive).
    pub fn subscribe<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for symbol in symbols {
            self.subscriptions.insert(symbol.as_ref().to_uppercase());
        }
    }

    /// Apply overrides. Host keys are handled here; everything else goes to
    /// the plug-in, which rejects keys it does not know.
    pub fn apply_parameters(&mut self, params: &ParamMap) -> Result<(), StrategyError> {
        let mut next = self.settings.clone();
        let mut forwarded = ParamMap::new();
        for (key, value) in params {
            match key.as_str() {
                WARMUP_KEY => next.warmup_bars = value.as_usize(key)?,
                MAX_STRENGTH_KEY => next.max_signal_strength = value.as_f64(key)?,
                MIN_INTERVAL_KEY => next.min_signal_interval = value.as_f64(key)?,
                _ => {
                    forwarded.insert(key.clone(), value.clone());
                }
            }
        }
        next.validate()?;
        self.strategy.apply_parameters(&forwarded)?;
        self.settings = next;
        Ok(())
    }

    pub fn initialize_segment(&mut self, segment_id: &str, metadata: &BTreeMap<String, String>) {
        self.processed = 0;
        self.last_timestamp = None;
        self.last_emission.clear();
        self.strategy.on_segment_start(segment_id, metadata);
    }

    /// Run one market event through the lifecycle and return finalized
    /// signals.
    pub fn on_market_data(
        &mut self,
        event: &MarketEvent,
        portfolio: &PortfolioLedger,
    ) -> Result<Vec<SignalEvent>, StrategyError> {
        let warmup = self.warmup_bars();
        let Some(ctx) = self.context.as_mut() else {
            return Err(StrategyError::ContextMissing {
                strategy: self.strategy.name().to_string(),
            });
        };

        if let Some(previous) = self.last_timestamp {
            if event.timestamp < previous {
                return Err(StrategyError::NonMonotonic {
                    strategy: self.strategy.name().to_string(),
                    previous,
                    current: event.timestamp,
                });
            }
        }
        self.last_timestamp = Some(event.timestamp);

        if !self.subscriptions.is_empty()
            && !self.subscriptions.contains(&event.symbol.to_uppercase())
        {
            return Ok(Vec::new());
        }

        self.processed += 1;
        if self.processed <= warmup {
            self.strategy.on_warmup(event, ctx);
            return Ok(Vec::new());
        }

        let raw = self.strategy.generate_signals(event, ctx, portfolio)?;
        let mut finalized = Vec::with_capacity(raw.len());
        for signal in raw {
            if !self.allow_emission(&signal.symbol, event.timestamp) {
                continue;
            }
            self.last_emission
                .insert(signal.symbol.clone(), event.timestamp);
            finalized.push(self.finalize(signal, event));
        }
        Ok(finalized)
    }

    fn allow_emission(&self, symbol: &str, timestamp: f64) -> bool {
        let interval = self.settings.min_signal_interval;
        if interval <= 0.0 {
            return true;
        }
        match self.last_emission.get(symbol) {
            Some(last) => timestamp - last >= interval,
            None => true,
        }
    }

    fn finalize(&self, signal: SignalEvent, event: &MarketEvent) -> SignalEvent {
        let max = self.settings.max_signal_strength;
        let signal_id = signal.signal_id.unwrap_or_else(|| {
            format!("{}-{}-{}", self.strategy.name(), signal.symbol, event.timestamp)
        });
        SignalEvent {
            strength: signal.strength.clamp(-max, max),
            signal_id: Some(signal_id),
            timestamp: Some(signal.timestamp.unwrap_or(event.timestamp)),
            ..signal
        }
    }
}

/// Convenience for building a one-key parameter map.
pub fn param(key: &str, value: impl Into<ParamValue>) -> ParamMap {
    let mut map = ParamMap::new();
    map.insert(key.to_string(), value.into());
    map
}
