//! Deterministic execution simulator.
//!
//! Resolution order for a single order against a market observation:
//! 1. Reject when the symbols differ (no fills).
//! 2. MARKET orders cross the spread; LIMIT orders fill at their limit price
//!    only when the market has reached it.
//! 3. Apply slippage to the resolved price.
//! 4. Split the quantity into partial fills per `partial_fill_ratio`.

use super::costs::CostModel;
use crate::domain::{FillEvent, MarketEvent, OrderEvent, OrderSide, OrderType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("invalid execution config: {field} must be a finite non-negative number, got {value}")]
    InvalidParameter { field: &'static str, value: f64 },
}

/// Execution simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub slippage_bps: f64,
    pub spread_bps: f64,
    pub commission_per_share: f64,
    /// A LIMIT order also fills when the market exactly equals the limit.
    pub fill_on_limit_touch: bool,
    /// Fraction of the remaining quantity filled per partial fill. `>= 1.0`
    /// means a single full fill.
    pub partial_fill_ratio: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 1.0,
            spread_bps: 0.5,
            commission_per_share: 0.0,
            fill_on_limit_touch: true,
            partial_fill_ratio: 1.0,
        }
    }
}

impl ExecutionConfig {
    /// No spread, slippage or commission.
    pub fn frictionless() -> Self {
        Self {
            slippage_bps: 0.0,
            spread_bps: 0.0,
            commission_per_share: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ExecutionError> {
        let fields = [
            ("slippage_bps", self.slippage_bps),
            ("spread_bps", self.spread_bps),
            ("commission_per_share", self.commission_per_share),
            ("partial_fill_ratio", self.partial_fill_ratio),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ExecutionError::InvalidParameter { field, value });
            }
        }
        Ok(())
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.spread_bps, self.slippage_bps, self.commission_per_share)
    }
}

/// Anything that can turn an order into fills given the latest market event.
pub trait ExecutionHandler: Send + Sync {
    fn execute(&self, order: &OrderEvent, market: &MarketEvent) -> Vec<FillEvent>;
}

/// The built-in deterministic simulator.
#[derive(Debug, Clone)]
pub struct SimulatedExecution {
    config: ExecutionConfig,
    costs: CostModel,
}

impl SimulatedExecution {
    pub fn new(config: ExecutionConfig) -> Result<Self, ExecutionError> {
        config.validate()?;
        let costs = config.cost_model();
        Ok(Self { config, costs })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Pre-slippage fill price, or `None` when a LIMIT order is not marketable.
    fn resolve_price(&self, order: &OrderEvent, mid: f64) -> Option<f64> {
        match order.order_type {
            OrderType::Market => Some(self.costs.crossing_price(mid, order.side)),
            OrderType::Limit => {
                let limit = order.limit_price?;
                let touch = self.config.fill_on_limit_touch;
                let marketable = match order.side {
                    OrderSide::Buy => mid < limit || (touch && mid <= limit),
                    OrderSide::Sell => mid > limit || (touch && mid >= limit),
                };
                marketable.then_some(limit)
            }
        }
    }

    /// Fill sizes summing to `quantity`.
    fn split_quantity(&self, quantity: u64, allow_partial: bool) -> Vec<u64> {
        let ratio = self.config.partial_fill_ratio;
        if quantity == 0 {
            return Vec::new();
        }
        if !allow_partial || ratio >= 1.0 {
            return vec![quantity];
        }
        let mut sizes = Vec::new();
        let mut remaining = quantity;
        while remaining > 0 {
            let chunk = ((remaining as f64 * ratio).floor() as u64).clamp(1, remaining);
            sizes.push(chunk);
            remaining -= chunk;
        }
        sizes
    }
}

impl ExecutionHandler for SimulatedExecution {
    fn execute(&self, order: &OrderEvent, market: &MarketEvent) -> Vec<FillEvent> {
        if order.symbol != market.symbol {
            return Vec::new();
        }
        let Some(raw) = self.resolve_price(order, market.price) else {
            return Vec::new();
        };
        let price = self.costs.apply_slippage(raw, order.side);

        self.split_quantity(order.quantity, order.allow_partial)
            .into_iter()
            .map(|qty| FillEvent {
                order_id: order.order_id,
                symbol: order.symbol.clone(),
                quantity: qty,
                side: order.side,
                price,
                commission: self.costs.commission(qty),
                slippage_bps: self.config.slippage_bps,
                spread_bps: self.config.spread_bps,
                timestamp: market.timestamp,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderId;

    fn sim(config: ExecutionConfig) -> SimulatedExecution {
        SimulatedExecution::new(config).unwrap()
    }

    fn tick(price: f64) -> MarketEvent {
        MarketEvent::new("AAPL", price, 1.0)
    }

    #[test]
    fn market_buy_pays_ask_plus_slippage() {
        let exec = sim(ExecutionConfig {
            spread_bps: 10.0,
            slippage_bps: 10.0,
            ..ExecutionConfig::frictionless()
        });
        let order = OrderEvent::market(OrderId(1), "AAPL", 10, OrderSide::Buy, 1.0);
        let fills = exec.execute(&order, &tick(100.0));
        assert_eq!(fills.len(), 1);
        // ask 100.1, then +10 bps
        assert!((fills[0].price - 100.1 * 1.001).abs() < 1e-9);
        assert_eq!(fills[0].quantity, 10);
    }

    #[test]
    fn market_sell_hits_bid() {
        let exec = sim(ExecutionConfig {
            spread_bps: 10.0,
            ..ExecutionConfig::frictionless()
        });
        let order = OrderEvent::market(OrderId(1), "AAPL", 5, OrderSide::Sell, 1.0);
        let fills = exec.execute(&order, &tick(100.0));
        assert!((fills[0].price - 99.9).abs() < 1e-9);
    }

    #[test]
    fn symbol_mismatch_yields_nothing() {
        let exec = sim(ExecutionConfig::default());
        let order = OrderEvent::market(OrderId(1), "MSFT", 10, OrderSide::Buy, 1.0);
        assert!(exec.execute(&order, &tick(100.0)).is_empty());
    }

    #[test]
    fn sell_limit_below_market_fills_at_limit() {
        let exec = sim(ExecutionConfig::frictionless());
        let order = OrderEvent::limit(OrderId(1), "AAPL", 10, OrderSide::Sell, 300.0, 1.0);
        let fills = exec.execute(&order, &tick(305.0));
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, 300.0);
    }

    #[test]
    fn buy_limit_not_reached_is_dropped() {
        let exec = sim(ExecutionConfig::frictionless());
        let order = OrderEvent::limit(OrderId(1), "AAPL", 10, OrderSide::Buy, 99.0, 1.0);
        assert!(exec.execute(&order, &tick(100.0)).is_empty());
    }

    #[test]
    fn limit_touch_respects_flag() {
        let order = OrderEvent::limit(OrderId(1), "AAPL", 10, OrderSide::Buy, 100.0, 1.0);
        let touching = sim(ExecutionConfig::frictionless());
        assert_eq!(touching.execute(&order, &tick(100.0)).len(), 1);

        let strict = sim(ExecutionConfig {
            fill_on_limit_touch: false,
            ..ExecutionConfig::frictionless()
        });
        assert!(strict.execute(&order, &tick(100.0)).is_empty());
        assert_eq!(strict.execute(&order, &tick(99.5)).len(), 1);
    }

    #[test]
    fn limit_without_price_never_fills() {
        let exec = sim(ExecutionConfig::frictionless());
        let mut order = OrderEvent::limit(OrderId(1), "AAPL", 10, OrderSide::Buy, 100.0, 1.0);
        order.limit_price = None;
        assert!(exec.execute(&order, &tick(50.0)).is_empty());
    }

    #[test]
    fn partial_fills_sum_to_order_quantity() {
        let exec = sim(ExecutionConfig {
            partial_fill_ratio: 0.5,
            commission_per_share: 0.01,
            ..ExecutionConfig::frictionless()
        });
        let order = OrderEvent::market(OrderId(1), "AAPL", 10, OrderSide::Buy, 1.0);
        let fills = exec.execute(&order, &tick(100.0));
        let sizes: Vec<u64> = fills.iter().map(|f| f.quantity).collect();
        assert_eq!(sizes, vec![5, 2, 1, 1, 1]);
        let total_commission: f64 = fills.iter().map(|f| f.commission).sum();
        assert!((total_commission - 0.10).abs() < 1e-12);
    }

    #[test]
    fn disallowed_partial_is_single_fill() {
        let exec = sim(ExecutionConfig {
            partial_fill_ratio: 0.25,
            ..ExecutionConfig::frictionless()
        });
        let mut order = OrderEvent::market(OrderId(1), "AAPL", 40, OrderSide::Buy, 1.0);
        order.allow_partial = false;
        let fills = exec.execute(&order, &tick(100.0));
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].quantity, 40);
    }

    #[test]
    fn validate_rejects_negative_costs() {
        let config = ExecutionConfig {
            spread_bps: -1.0,
            ..ExecutionConfig::default()
        };
        assert!(matches!(
            SimulatedExecution::new(config),
            Err(ExecutionError::InvalidParameter { field: "spread_bps", .. })
        ));
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ExecutionConfig::default();
        assert_eq!(config.slippage_bps, 1.0);
        assert_eq!(config.spread_bps, 0.5);
        assert_eq!(config.commission_per_share, 0.0);
        assert!(config.fill_on_limit_touch);
        assert_eq!(config.partial_fill_ratio, 1.0);
    }
}
