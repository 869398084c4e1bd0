//! TOML run configuration.
//!
//! ```toml
//! [run]
//! output_dir = "artifacts"
//! seed = 42
//! initial_cash = 1000000.0
//! mode = "walk_forward"
//! walk_forward_window = 20
//!
//! [strategy]
//! name = "momentum"
//! warmup_bars = 0
//! subscriptions = ["AAPL"]
//!
//! [strategy.params]
//! lookback = 5
//! threshold = 0.005
//!
//! [execution]
//! slippage_bps = 1.0
//! spread_bps = 0.5
//!
//! [[grid]]
//! lookback = 3
//!
//! [data]
//! symbol = "AAPL"
//! start = "2020-01-01"
//! end = "2020-12-31"
//! provider_chain = [{ name = "synthetic", seed = 7 }]
//! ```
//!
//! Dates are quoted strings. Every section except `[strategy]` is optional.

use chrono::{NaiveDate, TimeZone, Utc};
use quantbt_core::data::{DataRequest, DataSettings};
use quantbt_core::engine::EngineMode;
use quantbt_core::execution::{ExecutionConfig, ExecutionError, SimulatedExecution};
use quantbt_core::strategy::{
    ParamMap, RegistryError, StrategyError, StrategyHost, StrategyRegistry, StrategySettings,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::runner::BacktestSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Explicit run id; derived from the config hash when absent.
    pub run_id: Option<String>,
    pub output_dir: PathBuf,
    pub seed: u64,
    pub initial_cash: f64,
    pub base_currency: String,
    pub mode: EngineMode,
    pub walk_forward_window: usize,
    pub progress: bool,
    pub checkpointing: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        let base = BacktestSettings::default();
        Self {
            run_id: None,
            output_dir: base.output_dir,
            seed: base.deterministic_seed,
            initial_cash: base.initial_cash,
            base_currency: base.base_currency,
            mode: base.mode,
            walk_forward_window: base.walk_forward_window,
            progress: base.enable_progress,
            checkpointing: base.enable_checkpointing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    pub name: String,
    #[serde(default)]
    pub params: ParamMap,
    #[serde(flatten)]
    pub settings: StrategySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_adjusted")]
    pub adjusted: bool,
    #[serde(flatten)]
    pub settings: DataSettings,
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_adjusted() -> bool {
    true
}

impl DataSection {
    pub fn request(&self) -> Result<DataRequest, ConfigError> {
        if self.start >= self.end {
            return Err(ConfigError::Invalid(format!(
                "data start {} must be before end {}",
                self.start, self.end
            )));
        }
        let midnight = |d: NaiveDate| {
            d.and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt))
                .ok_or_else(|| ConfigError::Invalid(format!("invalid date {d}")))
        };
        Ok(DataRequest {
            symbol: self.symbol.clone(),
            start: midnight(self.start)?,
            end: midnight(self.end)?,
            interval: self.interval.clone(),
            adjusted: self.adjusted,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSection,
    pub strategy: StrategySection,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub grid: Vec<ParamMap>,
    #[serde(default)]
    pub data: Option<DataSection>,
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Structural checks that need no registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.settings.validate()?;
        self.execution.validate()?;
        if !self.run.initial_cash.is_finite() {
            return Err(ConfigError::Invalid("initial_cash must be finite".into()));
        }
        if self.run.mode != EngineMode::GridSearch && !self.grid.is_empty() {
            tracing::warn!(mode = %self.run.mode, "[[grid]] entries are ignored outside grid_search mode");
        }
        if let Some(data) = &self.data {
            data.request()?;
        }
        Ok(())
    }

    /// BLAKE3 hex digest of the canonical JSON form of the config.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }

    /// Configured run id, or `run-<first 12 hex chars of the config hash>`.
    pub fn run_id(&self) -> Result<String, ConfigError> {
        match &self.run.run_id {
            Some(id) => Ok(id.clone()),
            None => Ok(format!("run-{}", &self.config_hash()?[..12])),
        }
    }

    pub fn backtest_settings(&self) -> Result<BacktestSettings, ConfigError> {
        Ok(BacktestSettings {
            run_id: self.run_id()?,
            output_dir: self.run.output_dir.clone(),
            deterministic_seed: self.run.seed,
            initial_cash: self.run.initial_cash,
            base_currency: self.run.base_currency.clone(),
            mode: self.run.mode,
            walk_forward_window: self.run.walk_forward_window,
            grid_parameters: self.grid.clone(),
            enable_progress: self.run.progress,
            enable_checkpointing: self.run.checkpointing,
        })
    }

    pub fn build_host(&self, registry: &StrategyRegistry) -> Result<StrategyHost, ConfigError> {
        let strategy = registry.create(&self.strategy.name, &self.strategy.params)?;
        Ok(StrategyHost::new(strategy, self.strategy.settings.clone())?)
    }

    pub fn execution_handler(&self) -> Result<SimulatedExecution, ConfigError> {
        Ok(SimulatedExecution::new(self.execution.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantbt_core::strategy::ParamValue;

    const SAMPLE: &str = r#"
[run]
output_dir = "out"
mode = "grid_search"

[strategy]
name = "momentum"
warmup_bars = 2
subscriptions = ["aapl"]

[strategy.params]
lookback = 4
weights = { AAPL = 1 }

[execution]
slippage_bps = 0.0
partial_fill_ratio = 0.5

[[grid]]
lookback = 3

[[grid]]
lookback = 6
threshold = 0.01

[data]
symbol = "AAPL"
start = "2020-01-01"
end = "2020-06-30"
provider_chain = [{ name = "synthetic", seed = 7 }]
"#;

    #[test]
    fn parses_every_section() {
        let config = RunConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.run.mode, EngineMode::GridSearch);
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.strategy.settings.warmup_bars, 2);
        assert_eq!(config.strategy.settings.subscriptions, ["aapl"]);
        assert_eq!(config.strategy.params["lookback"], ParamValue::Int(4));
        assert_eq!(config.execution.partial_fill_ratio, 0.5);
        assert_eq!(config.execution.spread_bps, 0.5);
        assert_eq!(config.grid.len(), 2);

        let data = config.data.as_ref().unwrap();
        assert_eq!(data.settings.provider_chain[0].seed, Some(7));
        assert_eq!(data.request().unwrap().interval, "1d");
    }

    #[test]
    fn run_id_from_hash_is_stable() {
        let a = RunConfig::from_toml_str(SAMPLE).unwrap();
        let b = RunConfig::from_toml_str(SAMPLE).unwrap();
        let id = a.run_id().unwrap();
        assert!(id.starts_with("run-"));
        assert_eq!(id.len(), 16);
        assert_eq!(id, b.run_id().unwrap());

        let mut c = a.clone();
        c.run.seed = 7;
        assert_ne!(c.run_id().unwrap(), id);
        c.run.run_id = Some("named".into());
        assert_eq!(c.run_id().unwrap(), "named");
    }

    #[test]
    fn builds_host_and_settings() {
        let config = RunConfig::from_toml_str(SAMPLE).unwrap();
        let host = config.build_host(&StrategyRegistry::with_builtins()).unwrap();
        assert_eq!(host.name(), "momentum");
        assert_eq!(host.warmup_bars(), 4);

        let settings = config.backtest_settings().unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.grid_parameters.len(), 2);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_strength = "[strategy]\nname = \"momentum\"\nmax_signal_strength = 0.0\n";
        assert!(matches!(
            RunConfig::from_toml_str(bad_strength),
            Err(ConfigError::Strategy(_))
        ));

        let bad_exec = "[strategy]\nname = \"x\"\n[execution]\nspread_bps = -1.0\n";
        assert!(matches!(
            RunConfig::from_toml_str(bad_exec),
            Err(ConfigError::Execution(_))
        ));

        let bad_dates = "[strategy]\nname = \"x\"\n[data]\nsymbol = \"A\"\nstart = \"2020-02-01\"\nend = \"2020-01-01\"\n";
        assert!(matches!(
            RunConfig::from_toml_str(bad_dates),
            Err(ConfigError::Invalid(_))
        ));

        assert!(matches!(
            RunConfig::from_toml_str("[strategy"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_strategy_and_param() {
        let registry = StrategyRegistry::with_builtins();
        let config = RunConfig::from_toml_str("[strategy]\nname = \"nope\"\n").unwrap();
        assert!(matches!(
            config.build_host(&registry),
            Err(ConfigError::Registry(RegistryError::Unregistered { .. }))
        ));

        let config =
            RunConfig::from_toml_str("[strategy]\nname = \"momentum\"\n[strategy.params]\nspeed = 1\n")
                .unwrap();
        assert!(matches!(
            config.build_host(&registry),
            Err(ConfigError::Registry(RegistryError::Parameter(_)))
        ));
    }
}
