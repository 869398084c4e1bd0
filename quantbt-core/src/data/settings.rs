//! Data-layer configuration and provider chain construction.

use super::cache::LocalDataCache;
use super::csv_provider::{LocalCsvProvider, DEFAULT_PATTERN};
use super::manager::DataManager;
use super::provider::{DataError, DataProvider};
use super::synthetic::SyntheticProvider;
use super::yahoo::YahooProvider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One entry in the provider chain. Options not used by a provider are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Backoff base in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ProviderConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            retries: None,
            backoff: None,
            pattern: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub cache_dir: PathBuf,
    pub data_dir: Option<PathBuf>,
    pub provider_chain: Vec<ProviderConfig>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data/cache"),
            data_dir: None,
            provider_chain: vec![
                ProviderConfig::named("local_csv"),
                ProviderConfig {
                    retries: Some(3),
                    backoff: Some(1.0),
                    ..ProviderConfig::named("yahoo")
                },
            ],
        }
    }
}

impl DataSettings {
    fn build_provider(&self, config: &ProviderConfig) -> Result<Option<Box<dyn DataProvider>>, DataError> {
        let provider: Box<dyn DataProvider> = match config.name.as_str() {
            "local_csv" => {
                let Some(dir) = &self.data_dir else {
                    tracing::debug!("no data dir configured; skipping local_csv");
                    return Ok(None);
                };
                Box::new(LocalCsvProvider::with_pattern(
                    dir.clone(),
                    config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN),
                ))
            }
            "yahoo" => {
                let backoff = config.backoff.unwrap_or(1.0);
                if backoff.is_nan() || backoff < 0.0 {
                    return Err(DataError::Validation(format!(
                        "yahoo backoff must be non-negative, got {backoff}"
                    )));
                }
                Box::new(YahooProvider::new(
                    config.retries.unwrap_or(3),
                    Duration::from_secs_f64(backoff),
                )?)
            }
            "synthetic" => Box::new(SyntheticProvider::new(config.seed.unwrap_or(0))),
            other => return Err(DataError::UnknownProvider(other.to_string())),
        };
        Ok(Some(provider))
    }

    pub fn build_providers(&self) -> Result<Vec<Box<dyn DataProvider>>, DataError> {
        let mut providers = Vec::new();
        for config in &self.provider_chain {
            if let Some(p) = self.build_provider(config)? {
                providers.push(p);
            }
        }
        if providers.is_empty() {
            return Err(DataError::EmptyProviderChain);
        }
        Ok(providers)
    }

    pub fn build_manager(&self) -> Result<DataManager, DataError> {
        let providers = self.build_providers()?;
        DataManager::new(LocalDataCache::new(&self.cache_dir)?, providers)
    }
}
