//! Event model for the simulation loop.
//!
//! A backtest is a FIFO stream of `Market → Signal → Order → Fill` events.
//! Market events are produced by the data layer, signals by strategies,
//! orders by the loop, and fills by the execution simulator. All are plain
//! values; nothing in an event is mutated after construction.

use super::ids::OrderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single price observation for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub symbol: String,
    pub price: f64,
    /// Seconds since the epoch.
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, f64>>,
}

impl MarketEvent {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, f64>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Desired exposure direction emitted by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    Long,
    Short,
}

impl SignalDirection {
    /// Order side that realizes this direction.
    pub fn order_side(self) -> OrderSide {
        match self {
            SignalDirection::Long => OrderSide::Buy,
            SignalDirection::Short => OrderSide::Sell,
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::Long => write!(f, "LONG"),
            SignalDirection::Short => write!(f, "SHORT"),
        }
    }
}

/// A strategy's intent for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub strength: f64,
    pub direction: SignalDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl SignalEvent {
    pub fn new(symbol: impl Into<String>, strength: f64, direction: SignalDirection) -> Self {
        Self {
            symbol: symbol.into(),
            strength,
            direction,
            signal_id: None,
            timestamp: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.signal_id = Some(id.into());
        self
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
}

/// An order routed to the execution simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub symbol: String,
    pub quantity: u64,
    pub side: OrderSide,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<String>,
    pub timestamp: f64,
    pub allow_partial: bool,
}

impl OrderEvent {
    pub fn market(
        order_id: OrderId,
        symbol: impl Into<String>,
        quantity: u64,
        side: OrderSide,
        timestamp: f64,
    ) -> Self {
        Self {
            order_id,
            symbol: symbol.into(),
            quantity,
            side,
            order_type: OrderType::Market,
            limit_price: None,
            signal_id: None,
            timestamp,
            allow_partial: true,
        }
    }

    pub fn limit(
        order_id: OrderId,
        symbol: impl Into<String>,
        quantity: u64,
        side: OrderSide,
        limit_price: f64,
        timestamp: f64,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            ..Self::market(order_id, symbol, quantity, side, timestamp)
        }
    }

    /// Build a market order from a signal.
    ///
    /// Quantity is `max(1, floor(|strength| * 100))`; LONG buys, SHORT sells.
    pub fn from_signal(order_id: OrderId, signal: &SignalEvent, timestamp: f64) -> Self {
        let scaled = (signal.strength.abs() * 100.0).floor();
        let quantity = if scaled.is_finite() && scaled >= 1.0 {
            scaled as u64
        } else {
            1
        };
        Self {
            signal_id: signal.signal_id.clone(),
            ..Self::market(
                order_id,
                signal.symbol.clone(),
                quantity,
                signal.direction.order_side(),
                signal.timestamp.unwrap_or(timestamp),
            )
        }
    }
}

/// Result of (part of) an order executing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: OrderId,
    pub symbol: String,
    pub quantity: u64,
    pub side: OrderSide,
    pub price: f64,
    pub commission: f64,
    pub slippage_bps: f64,
    pub spread_bps: f64,
    pub timestamp: f64,
}

impl FillEvent {
    /// Quantity with the sign of the side: positive for buys.
    pub fn signed_quantity(&self) -> f64 {
        self.quantity as f64 * self.side.sign()
    }

    /// Absolute traded value, excluding commission.
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// Everything that can sit on the event queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            Event::Market(e) => Some(e.timestamp),
            Event::Signal(e) => e.timestamp,
            Event::Order(e) => Some(e.timestamp),
            Event::Fill(e) => Some(e.timestamp),
        }
    }
}
