//! Strategy layer: the plug-in contract, the lifecycle host, typed
//! parameters, indicators, the registry and the built-in strategies.

pub mod builtin;
pub mod context;
pub mod contract;
pub mod host;
pub mod indicators;
pub mod params;
pub mod registry;

pub use builtin::{MeanReversion, Momentum, StaticSignal};
pub use context::StrategyContext;
pub use contract::{Strategy, StrategyError, StrategySettings};
pub use host::StrategyHost;
pub use indicators::IndicatorCache;
pub use params::{ParamError, ParamMap, ParamValue};
pub use registry::{RegistryError, StrategyFactory, StrategyRegistry};
