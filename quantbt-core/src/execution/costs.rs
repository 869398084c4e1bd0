//! Cost model: bid/ask spread, slippage and per-share commission.
//!
//! Spread is symmetric around the observed mid price. Slippage is directional:
//! buyers pay more, sellers receive less. Commission is a flat amount per share.

use crate::domain::OrderSide;

/// Execution friction applied to every fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub spread_bps: f64,
    pub slippage_bps: f64,
    pub commission_per_share: f64,
}

impl CostModel {
    pub fn new(spread_bps: f64, slippage_bps: f64, commission_per_share: f64) -> Self {
        Self {
            spread_bps,
            slippage_bps,
            commission_per_share,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// `(bid, ask)` around `mid`, with `half = spread_bps / 10_000 * mid`.
    pub fn quote(&self, mid: f64) -> (f64, f64) {
        let half = self.spread_bps / 10_000.0 * mid;
        (mid - half, mid + half)
    }

    /// Price a market order crosses at: the ask for buys, the bid for sells.
    pub fn crossing_price(&self, mid: f64, side: OrderSide) -> f64 {
        let (bid, ask) = self.quote(mid);
        match side {
            OrderSide::Buy => ask,
            OrderSide::Sell => bid,
        }
    }

    /// Apply directional slippage to a resolved fill price.
    pub fn apply_slippage(&self, price: f64, side: OrderSide) -> f64 {
        let frac = self.slippage_bps / 10_000.0;
        match side {
            OrderSide::Buy => price * (1.0 + frac),
            OrderSide::Sell => price * (1.0 - frac),
        }
    }

    pub fn commission(&self, quantity: u64) -> f64 {
        quantity as f64 * self.commission_per_share
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_is_identity() {
        let cost = CostModel::frictionless();
        assert_eq!(cost.quote(100.0), (100.0, 100.0));
        assert_eq!(cost.apply_slippage(100.0, OrderSide::Buy), 100.0);
        assert_eq!(cost.commission(500), 0.0);
    }

    #[test]
    fn spread_is_symmetric() {
        let cost = CostModel::new(10.0, 0.0, 0.0);
        let (bid, ask) = cost.quote(100.0);
        assert!((bid - 99.9).abs() < 1e-10);
        assert!((ask - 100.1).abs() < 1e-10);
        assert_eq!(cost.crossing_price(100.0, OrderSide::Buy), ask);
        assert_eq!(cost.crossing_price(100.0, OrderSide::Sell), bid);
    }

    #[test]
    fn slippage_is_adverse() {
        let cost = CostModel::new(0.0, 10.0, 0.0);
        assert!((cost.apply_slippage(100.0, OrderSide::Buy) - 100.10).abs() < 1e-10);
        assert!((cost.apply_slippage(100.0, OrderSide::Sell) - 99.90).abs() < 1e-10);
    }

    #[test]
    fn commission_per_share() {
        let cost = CostModel::new(0.0, 0.0, 0.005);
        assert!((cost.commission(200) - 1.0).abs() < 1e-12);
    }
}
