//! Portfolio ledger — per-currency cash, positions, margin and borrow costs.
//!
//! The accounting identity holds after every mutating call:
//!
//! `equity == Σ cash + Σ position market value − margin_reserved − borrow_costs`
//!
//! The ledger does no business-rule validation: cash may go negative and no
//! leverage limits are enforced.

use super::position::Position;
use super::trade_log::{self, TradeLogError, TradeRecord};
use crate::domain::FillEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Flat, ordered snapshot of the ledger (stable JSON key order).
pub type PortfolioSnapshot = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureSummary {
    pub gross: f64,
    pub net: f64,
    pub leverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioLedger {
    base_currency: String,
    cash: BTreeMap<String, f64>,
    positions: BTreeMap<String, Position>,
    realized_pnl: f64,
    unrealized_pnl: f64,
    fees: f64,
    margin_reserved: f64,
    borrow_costs: f64,
    equity: f64,
    trade_log: Vec<TradeRecord>,
}

impl PortfolioLedger {
    pub fn new(base_currency: impl Into<String>) -> Self {
        let base_currency = base_currency.into();
        let mut cash = BTreeMap::new();
        cash.insert(base_currency.clone(), 0.0);
        Self {
            base_currency,
            cash,
            positions: BTreeMap::new(),
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            fees: 0.0,
            margin_reserved: 0.0,
            borrow_costs: 0.0,
            equity: 0.0,
            trade_log: Vec::new(),
        }
    }

    /// Ledger funded with `initial_cash` in the base currency.
    pub fn with_cash(base_currency: impl Into<String>, initial_cash: f64) -> Self {
        let mut ledger = Self::new(base_currency);
        let ccy = ledger.base_currency.clone();
        ledger.deposit(initial_cash, &ccy);
        ledger
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn cash(&self, currency: &str) -> f64 {
        self.cash.get(currency).copied().unwrap_or(0.0)
    }

    pub fn cash_balances(&self) -> &BTreeMap<String, f64> {
        &self.cash
    }

    /// Sum of every currency bucket, without conversion.
    pub fn total_cash(&self) -> f64 {
        self.cash.values().sum()
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    pub fn fees(&self) -> f64 {
        self.fees
    }

    pub fn margin_reserved(&self) -> f64 {
        self.margin_reserved
    }

    pub fn borrow_costs(&self) -> f64 {
        self.borrow_costs
    }

    pub fn trade_log(&self) -> &[TradeRecord] {
        &self.trade_log
    }

    // ─── Mutations ───────────────────────────────────────────────────

    pub fn deposit(&mut self, amount: f64, currency: &str) {
        *self.cash.entry(currency.to_string()).or_insert(0.0) += amount;
        self.revalue();
    }

    pub fn withdraw(&mut self, amount: f64, currency: &str) {
        *self.cash.entry(currency.to_string()).or_insert(0.0) -= amount;
        self.revalue();
    }

    /// Mark an existing position to `price`. Unknown symbols are ignored
    /// (the ledger is still revalued).
    pub fn mark_price(&mut self, symbol: &str, price: f64) {
        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.last_price = price;
        }
        self.revalue();
    }

    /// Apply a fill settled in the base currency.
    pub fn apply_fill(&mut self, fill: &FillEvent) {
        let ccy = self.base_currency.clone();
        self.apply_fill_in(fill, &ccy);
    }

    /// Apply a fill settled in `currency`.
    pub fn apply_fill_in(&mut self, fill: &FillEvent, currency: &str) {
        let delta = fill.signed_quantity();
        let position = self
            .positions
            .entry(fill.symbol.clone())
            .or_insert_with(|| Position::new(fill.symbol.clone()));
        self.realized_pnl += position.apply(delta, fill.price);

        *self.cash.entry(currency.to_string()).or_insert(0.0) +=
            -delta * fill.price - fill.commission;
        self.fees += fill.commission;

        self.trade_log.push(TradeRecord {
            timestamp: fill.timestamp,
            symbol: fill.symbol.clone(),
            quantity: fill.quantity,
            direction: fill.side,
            price: fill.price,
            commission: fill.commission,
            currency: currency.to_string(),
        });
        self.revalue();
    }

    pub fn reserve_margin(&mut self, amount: f64) {
        self.margin_reserved += amount;
        *self.base_cash_mut() -= amount;
        self.revalue();
    }

    /// Release margin back to base cash. The reserve floors at zero but the
    /// full `amount` is credited.
    pub fn release_margin(&mut self, amount: f64) {
        self.margin_reserved = (self.margin_reserved - amount).max(0.0);
        *self.base_cash_mut() += amount;
        self.revalue();
    }

    pub fn accrue_borrow_cost(&mut self, amount: f64) {
        self.borrow_costs += amount;
        *self.base_cash_mut() -= amount;
        self.revalue();
    }

    fn base_cash_mut(&mut self) -> &mut f64 {
        self.cash.entry(self.base_currency.clone()).or_insert(0.0)
    }

    /// Recompute unrealized PnL and equity from current state.
    fn revalue(&mut self) {
        let (market_value, unrealized) = self
            .positions
            .values()
            .fold((0.0, 0.0), |(mv, upnl), p| {
                (mv + p.market_value(), upnl + p.unrealized_pnl())
            });
        self.unrealized_pnl = unrealized;
        self.equity = self.total_cash() + market_value - self.margin_reserved - self.borrow_costs;
    }

    // ─── Reporting ───────────────────────────────────────────────────

    pub fn exposure_summary(&self) -> ExposureSummary {
        let gross: f64 = self.positions.values().map(|p| p.market_value().abs()).sum();
        let net: f64 = self.positions.values().map(Position::market_value).sum();
        let leverage = if self.equity == 0.0 {
            0.0
        } else {
            gross / self.equity.abs()
        };
        ExposureSummary {
            gross,
            net,
            leverage,
        }
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        let mut snap = PortfolioSnapshot::new();
        snap.insert("cash".into(), self.total_cash());
        snap.insert("equity".into(), self.equity);
        snap.insert("realized_pnl".into(), self.realized_pnl);
        snap.insert("unrealized_pnl".into(), self.unrealized_pnl);
        snap.insert("fees".into(), self.fees);
        snap.insert("margin_reserved".into(), self.margin_reserved);
        snap.insert("borrow_costs".into(), self.borrow_costs);
        for (ccy, amount) in &self.cash {
            snap.insert(format!("cash_{ccy}"), *amount);
        }
        for (symbol, pos) in &self.positions {
            snap.insert(symbol.clone(), pos.quantity);
        }
        let exposure = self.exposure_summary();
        snap.insert("gross_exposure".into(), exposure.gross);
        snap.insert("net_exposure".into(), exposure.net);
        snap.insert("leverage".into(), exposure.leverage);
        snap
    }

    pub fn export_trades(&self, path: &Path) -> Result<(), TradeLogError> {
        trade_log::export_csv(&self.trade_log, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, OrderSide};

    fn fill(symbol: &str, qty: u64, side: OrderSide, price: f64, commission: f64) -> FillEvent {
        FillEvent {
            order_id: OrderId(1),
            symbol: symbol.into(),
            quantity: qty,
            side,
            price,
            commission,
            slippage_bps: 0.0,
            spread_bps: 0.0,
            timestamp: 0.0,
        }
    }

    fn identity_holds(ledger: &PortfolioLedger) -> bool {
        let mv: f64 = ledger.positions().map(Position::market_value).sum();
        let expected =
            ledger.total_cash() + mv - ledger.margin_reserved() - ledger.borrow_costs();
        (ledger.equity() - expected).abs() < 1e-9
    }

    #[test]
    fn deposit_sets_equity() {
        let ledger = PortfolioLedger::with_cash("USD", 10_000.0);
        assert_eq!(ledger.equity(), 10_000.0);
        assert_eq!(ledger.cash("USD"), 10_000.0);
    }

    #[test]
    fn buy_then_partial_sell() {
        let mut ledger = PortfolioLedger::with_cash("USD", 100_000.0);
        ledger.apply_fill(&fill("AAPL", 50, OrderSide::Buy, 100.0, 1.0));
        ledger.apply_fill(&fill("AAPL", 30, OrderSide::Sell, 110.0, 1.0));

        let pos = ledger.position("AAPL").unwrap();
        assert_eq!(pos.quantity, 20.0);
        assert!((pos.avg_cost - 100.0).abs() < 1e-10);
        assert!((ledger.realized_pnl() - 300.0).abs() < 1e-10);
        assert!((ledger.fees() - 2.0).abs() < 1e-10);
        // 100_000 - 5_000 - 1 + 3_300 - 1
        assert!((ledger.cash("USD") - 98_298.0).abs() < 1e-9);
        assert!(identity_holds(&ledger));
        assert_eq!(ledger.trade_log().len(), 2);
    }

    #[test]
    fn mark_price_revalues() {
        let mut ledger = PortfolioLedger::with_cash("USD", 1_000.0);
        ledger.apply_fill(&fill("AAPL", 5, OrderSide::Buy, 100.0, 0.0));
        ledger.mark_price("AAPL", 120.0);
        assert!((ledger.unrealized_pnl() - 100.0).abs() < 1e-10);
        assert!((ledger.equity() - 1_100.0).abs() < 1e-10);
        ledger.mark_price("MSFT", 50.0);
        assert!(ledger.position("MSFT").is_none());
    }

    #[test]
    fn margin_and_borrow() {
        let mut ledger = PortfolioLedger::with_cash("USD", 1_000.0);
        ledger.reserve_margin(200.0);
        assert_eq!(ledger.cash("USD"), 800.0);
        assert_eq!(ledger.margin_reserved(), 200.0);
        assert_eq!(ledger.equity(), 600.0);
        assert!(identity_holds(&ledger));

        ledger.release_margin(300.0);
        assert_eq!(ledger.margin_reserved(), 0.0);
        assert_eq!(ledger.cash("USD"), 1_100.0);

        ledger.accrue_borrow_cost(10.0);
        assert_eq!(ledger.borrow_costs(), 10.0);
        assert_eq!(ledger.cash("USD"), 1_090.0);
        assert!(identity_holds(&ledger));
    }

    #[test]
    fn multi_currency_buckets() {
        let mut ledger = PortfolioLedger::with_cash("USD", 1_000.0);
        ledger.deposit(500.0, "EUR");
        ledger.apply_fill_in(&fill("SAP", 2, OrderSide::Buy, 100.0, 0.0), "EUR");
        assert_eq!(ledger.cash("EUR"), 300.0);
        assert_eq!(ledger.total_cash(), 1_300.0);
        let snap = ledger.snapshot();
        assert_eq!(snap["cash_EUR"], 300.0);
        assert_eq!(snap["cash_USD"], 1_000.0);
        assert_eq!(ledger.trade_log()[0].currency, "EUR");
    }

    #[test]
    fn snapshot_keys_and_exposure() {
        let mut ledger = PortfolioLedger::with_cash("USD", 10_000.0);
        ledger.apply_fill(&fill("AAPL", 10, OrderSide::Buy, 100.0, 0.0));
        ledger.apply_fill(&fill("MSFT", 5, OrderSide::Sell, 200.0, 0.0));
        let snap = ledger.snapshot();
        for key in [
            "cash",
            "equity",
            "realized_pnl",
            "unrealized_pnl",
            "fees",
            "margin_reserved",
            "borrow_costs",
            "gross_exposure",
            "net_exposure",
            "leverage",
        ] {
            assert!(snap.contains_key(key), "missing {key}");
        }
        assert_eq!(snap["AAPL"], 10.0);
        assert_eq!(snap["MSFT"], -5.0);
        assert_eq!(snap["gross_exposure"], 2_000.0);
        assert_eq!(snap["net_exposure"], 0.0);
        assert!((snap["leverage"] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn zero_equity_has_zero_leverage() {
        let ledger = PortfolioLedger::new("USD");
        assert_eq!(ledger.exposure_summary().leverage, 0.0);
    }

    #[test]
    fn export_trades_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("trades.csv");
        let mut ledger = PortfolioLedger::with_cash("USD", 1_000.0);
        ledger.apply_fill(&fill("AAPL", 1, OrderSide::Buy, 10.0, 0.0));
        ledger.export_trades(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
