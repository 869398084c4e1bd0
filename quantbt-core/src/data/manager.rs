//! Provider chain with a validated cache in front.

use super::cache::LocalDataCache;
use super::provider::{DataError, DataProvider, DataRequest, PriceRow};
use super::validator::DataValidator;

pub struct DataManager {
    cache: LocalDataCache,
    providers: Vec<Box<dyn DataProvider>>,
    validator: DataValidator,
}

impl std::fmt::Debug for DataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataManager")
            .field("cache", &self.cache)
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl DataManager {
    pub fn new(
        cache: LocalDataCache,
        providers: Vec<Box<dyn DataProvider>>,
    ) -> Result<Self, DataError> {
        if providers.is_empty() {
            return Err(DataError::EmptyProviderChain);
        }
        Ok(Self {
            cache,
            providers,
            validator: DataValidator::new(),
        })
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn cache(&self) -> &LocalDataCache {
        &self.cache
    }

    /// Return validated rows for `request`.
    ///
    /// A cached frame that fails validation is ignored and refetched.
    /// Provider errors that are not recoverable (cache write failures,
    /// configuration errors) abort the chain immediately.
    pub fn fetch(&self, request: &DataRequest) -> Result<Vec<PriceRow>, DataError> {
        let key = request.cache_key();

        match self.cache.load_frame(&key) {
            Ok(Some(rows)) => match self.validator.validate(rows, request) {
                Ok(rows) => {
                    tracing::debug!(key = %key, rows = rows.len(), "cache hit");
                    return Ok(rows);
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "cached frame invalid; refetching"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, error = %e, "cache read failed"),
        }

        let mut causes = Vec::new();
        for provider in &self.providers {
            let attempt = provider
                .fetch(request)
                .and_then(|rows| self.validator.validate(rows, request));
            match attempt {
                Ok(rows) => {
                    self.cache.store_frame(&key, &rows)?;
                    tracing::info!(
                        provider = provider.name(),
                        symbol = %request.symbol,
                        rows = rows.len(),
                        "fetched"
                    );
                    return Ok(rows);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(provider = provider.name(), error = %e, "provider failed");
                    causes.push(format!("{}: {e}", provider.name()));
                }
                Err(e) => return Err(e),
            }
        }
        Err(DataError::FetchFailed { causes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Failing;

    impl DataProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn fetch(&self, _: &DataRequest) -> Result<Vec<PriceRow>, DataError> {
            Err(DataError::provider("failing", "offline"))
        }
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl DataProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        fn fetch(&self, request: &DataRequest) -> Result<Vec<PriceRow>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PriceRow {
                timestamp: request.start,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 10.0,
            }])
        }
    }

    fn request() -> DataRequest {
        DataRequest::daily(
            "AAPL",
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn empty_chain_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDataCache::new(dir.path()).unwrap();
        assert!(matches!(
            DataManager::new(cache, Vec::new()),
            Err(DataError::EmptyProviderChain)
        ));
    }

    #[test]
    fn falls_through_then_caches() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDataCache::new(dir.path()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = DataManager::new(
            cache,
            vec![
                Box::new(Failing),
                Box::new(Counting {
                    calls: Arc::clone(&calls),
                }),
            ],
        )
        .unwrap();

        assert_eq!(manager.fetch(&request()).unwrap().len(), 1);
        assert_eq!(manager.fetch(&request()).unwrap().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn all_failures_collected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDataCache::new(dir.path()).unwrap();
        let manager =
            DataManager::new(cache, vec![Box::new(Failing), Box::new(Failing)]).unwrap();
        match manager.fetch(&request()) {
            Err(DataError::FetchFailed { causes }) => assert_eq!(causes.len(), 2),
            other => panic!("expected FetchFailed, got {other:?}"),
        }
    }
}
