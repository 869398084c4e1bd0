//! Position — signed holding in one symbol with average-cost accounting.

use serde::{Deserialize, Serialize};

/// A signed position. Positive quantity is long, negative is short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub last_price: f64,
    pub realized_pnl: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0.0,
            avg_cost: 0.0,
            last_price: 0.0,
            realized_pnl: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    pub fn market_value(&self) -> f64 {
        self.quantity * self.last_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.quantity * (self.last_price - self.avg_cost)
    }

    /// Apply a signed quantity change at `price`. Returns the realized PnL
    /// produced by the change.
    ///
    /// Adding to a position (or opening from flat) blends the average cost.
    /// Reducing realizes PnL on the closed quantity and keeps the average
    /// cost; closing resets it to zero; flipping through zero starts the new
    /// side at `price`.
    pub fn apply(&mut self, delta: f64, price: f64) -> f64 {
        let old_qty = self.quantity;
        let new_qty = old_qty + delta;
        let mut realized = 0.0;

        if old_qty == 0.0 || old_qty.signum() == delta.signum() {
            if new_qty != 0.0 {
                self.avg_cost = (self.avg_cost * old_qty + price * delta) / new_qty;
            }
        } else {
            let closing = delta.abs().min(old_qty.abs());
            realized = if old_qty > 0.0 {
                closing * (price - self.avg_cost)
            } else {
                closing * (self.avg_cost - price)
            };
            if new_qty == 0.0 {
                self.avg_cost = 0.0;
            } else if new_qty.signum() != old_qty.signum() {
                self.avg_cost = price;
            }
        }

        self.quantity = new_qty;
        self.last_price = price;
        self.realized_pnl += realized;
        realized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_add_blends_cost() {
        let mut pos = Position::new("AAPL");
        assert_eq!(pos.apply(10.0, 100.0), 0.0);
        assert_eq!(pos.apply(10.0, 110.0), 0.0);
        assert_eq!(pos.quantity, 20.0);
        assert!((pos.avg_cost - 105.0).abs() < 1e-10);
    }

    #[test]
    fn partial_close_keeps_cost() {
        let mut pos = Position::new("AAPL");
        pos.apply(50.0, 100.0);
        let realized = pos.apply(-30.0, 110.0);
        assert!((realized - 300.0).abs() < 1e-10);
        assert_eq!(pos.quantity, 20.0);
        assert!((pos.avg_cost - 100.0).abs() < 1e-10);
        assert_eq!(pos.last_price, 110.0);
    }

    #[test]
    fn full_close_resets_cost() {
        let mut pos = Position::new("AAPL");
        pos.apply(10.0, 100.0);
        pos.apply(-10.0, 90.0);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_cost, 0.0);
        assert!((pos.realized_pnl + 100.0).abs() < 1e-10);
    }

    #[test]
    fn flip_sets_cost_to_fill_price() {
        let mut pos = Position::new("AAPL");
        pos.apply(10.0, 100.0);
        let realized = pos.apply(-25.0, 120.0);
        assert!((realized - 200.0).abs() < 1e-10);
        assert_eq!(pos.quantity, -15.0);
        assert_eq!(pos.avg_cost, 120.0);
    }

    #[test]
    fn short_cover_realizes_inverse_pnl() {
        let mut pos = Position::new("AAPL");
        pos.apply(-10.0, 100.0);
        let realized = pos.apply(4.0, 90.0);
        assert!((realized - 40.0).abs() < 1e-10);
        assert_eq!(pos.quantity, -6.0);
        assert!((pos.unrealized_pnl() - 60.0).abs() < 1e-10);
        assert!((pos.market_value() + 540.0).abs() < 1e-10);
    }
}
