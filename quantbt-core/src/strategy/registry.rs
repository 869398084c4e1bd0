//! Strategy registry — name → factory lookup.
//!
//! Names are case-insensitive. Factories receive the parameter overrides
//! from configuration and return a ready plug-in.

use super::builtin::{MeanReversion, Momentum, StaticSignal};
use super::contract::Strategy;
use super::params::{ParamError, ParamMap};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type StrategyFactory =
    Arc<dyn Fn(&ParamMap) -> Result<Box<dyn Strategy>, ParamError> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("strategy '{name}' not registered (available: {available})")]
    Unregistered { name: String, available: String },

    #[error(transparent)]
    Parameter(#[from] ParamError),
}

#[derive(Clone, Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.available())
            .finish()
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `static-signal`, `momentum` and
    /// `mean-reversion`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(StaticSignal::NAME, |params: &ParamMap| {
            let mut s = StaticSignal::default();
            s.apply_parameters(params)?;
            Ok(Box::new(s) as Box<dyn Strategy>)
        });
        registry.register(Momentum::NAME, |params: &ParamMap| {
            let mut s = Momentum::default();
            s.apply_parameters(params)?;
            Ok(Box::new(s) as Box<dyn Strategy>)
        });
        registry.register(MeanReversion::NAME, |params: &ParamMap| {
            let mut s = MeanReversion::default();
            s.apply_parameters(params)?;
            Ok(Box::new(s) as Box<dyn Strategy>)
        });
        registry
    }

    /// Register (or replace) a factory.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ParamMap) -> Result<Box<dyn Strategy>, ParamError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_lowercase(), Arc::new(factory));
    }

    pub fn factory(&self, name: &str) -> Result<StrategyFactory, RegistryError> {
        self.factories
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| RegistryError::Unregistered {
                name: name.to_string(),
                available: self.available().join(", "),
            })
    }

    pub fn create(&self, name: &str, params: &ParamMap) -> Result<Box<dyn Strategy>, RegistryError> {
        let factory = self.factory(name)?;
        Ok(factory(params)?)
    }

    /// Registered names, sorted.
    pub fn available(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}
