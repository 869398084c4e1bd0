//! Per-segment context attached to a strategy host.

use super::indicators::IndicatorCache;
use crate::rng::DeterministicRandom;
use std::collections::BTreeMap;

/// Indicator cache, run/segment metadata and a seeded random source.
///
/// The portfolio is not stored here; the host passes `&PortfolioLedger` to
/// each `generate_signals` call.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    name: String,
    indicators: IndicatorCache,
    metadata: BTreeMap<String, String>,
    random: DeterministicRandom,
}

impl StrategyContext {
    pub fn new(name: impl Into<String>, random_seed: u64) -> Self {
        Self {
            name: name.into(),
            indicators: IndicatorCache::new(),
            metadata: BTreeMap::new(),
            random: DeterministicRandom::new(random_seed),
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn random_seed(&self) -> u64 {
        self.random.seed()
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn indicators(&self) -> &IndicatorCache {
        &self.indicators
    }

    pub fn indicators_mut(&mut self) -> &mut IndicatorCache {
        &mut self.indicators
    }

    pub fn random(&mut self) -> &mut DeterministicRandom {
        &mut self.random
    }
}
