//! Data layer — fetch validated daily price rows for a symbol.
//!
//! Pipeline: `DataManager::fetch(request)` checks the CSV frame cache, then
//! walks its provider chain (local CSV, synthetic, Yahoo) until one returns
//! rows that pass the `DataValidator`. `convert` turns rows into market
//! events for the engine.

pub mod cache;
pub mod convert;
pub mod csv_provider;
pub mod frame;
pub mod manager;
pub mod provider;
pub mod settings;
pub mod synthetic;
pub mod validator;
pub mod yahoo;

pub use cache::LocalDataCache;
pub use convert::rows_to_market_events;
pub use csv_provider::LocalCsvProvider;
pub use manager::DataManager;
pub use provider::{DataError, DataProvider, DataRequest, PriceRow};
pub use settings::{DataSettings, ProviderConfig};
pub use synthetic::SyntheticProvider;
pub use validator::DataValidator;
pub use yahoo::YahooProvider;
