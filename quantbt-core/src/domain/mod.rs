//! Domain types: the four event kinds that flow through a backtest and the
//! identifiers attached to them.

pub mod events;
pub mod ids;

pub use events::{
    Event, FillEvent, MarketEvent, OrderEvent, OrderSide, OrderType, SignalDirection, SignalEvent,
};
pub use ids::{OrderId, OrderIdGenerator, RunId};
