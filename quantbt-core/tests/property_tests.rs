//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Accounting identity — equity equals cash plus market value minus
//!    reserves after every ledger mutation
//! 2. Fill conservation — fills of a marketable order sum to its quantity
//! 3. Determinism — replaying a random tape gives the same final snapshot

use proptest::prelude::*;
use quantbt_core::domain::{
    FillEvent, MarketEvent, OrderEvent, OrderId, OrderIdGenerator, OrderSide, SignalDirection,
};
use quantbt_core::engine::{run_segment, SegmentPlan};
use quantbt_core::execution::{ExecutionConfig, ExecutionHandler, SimulatedExecution};
use quantbt_core::logging::RunLogger;
use quantbt_core::portfolio::PortfolioLedger;
use quantbt_core::strategy::{StaticSignal, StrategyContext, StrategyHost, StrategySettings};
use std::collections::BTreeMap;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (10.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_side() -> impl Strategy<Value = OrderSide> {
    prop_oneof![Just(OrderSide::Buy), Just(OrderSide::Sell)]
}

#[derive(Debug, Clone)]
enum Op {
    Fill(u64, OrderSide, f64, f64),
    Mark(f64),
    Deposit(f64),
    Reserve(f64),
    Release(f64),
    Borrow(f64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u64..500, arb_side(), arb_price(), 0.0..5.0_f64)
            .prop_map(|(q, s, p, c)| Op::Fill(q, s, p, c)),
        3 => arb_price().prop_map(Op::Mark),
        1 => (0.0..1000.0_f64).prop_map(Op::Deposit),
        1 => (0.0..1000.0_f64).prop_map(Op::Reserve),
        1 => (0.0..1000.0_f64).prop_map(Op::Release),
        1 => (0.0..50.0_f64).prop_map(Op::Borrow),
    ]
}

fn identity_gap(ledger: &PortfolioLedger) -> f64 {
    let market_value: f64 = ledger.positions().map(|p| p.market_value()).sum();
    let expected =
        ledger.total_cash() + market_value - ledger.margin_reserved() - ledger.borrow_costs();
    (ledger.equity() - expected).abs()
}

// ── 1. Accounting identity ───────────────────────────────────────────

proptest! {
    #[test]
    fn equity_identity_holds(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut ledger = PortfolioLedger::with_cash("USD", 100_000.0);
        for op in ops {
            match op {
                Op::Fill(qty, side, price, commission) => ledger.apply_fill(&FillEvent {
                    order_id: OrderId(1),
                    symbol: "SPY".into(),
                    quantity: qty,
                    side,
                    price,
                    commission,
                    slippage_bps: 0.0,
                    spread_bps: 0.0,
                    timestamp: 0.0,
                }),
                Op::Mark(price) => ledger.mark_price("SPY", price),
                Op::Deposit(amount) => ledger.deposit(amount, "USD"),
                Op::Reserve(amount) => ledger.reserve_margin(amount),
                Op::Release(amount) => ledger.release_margin(amount),
                Op::Borrow(amount) => ledger.accrue_borrow_cost(amount),
            }
            prop_assert!(identity_gap(&ledger) < 1e-6);
            prop_assert!(ledger.margin_reserved() >= 0.0);
        }
    }
}

// ── 2. Fill conservation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn fills_sum_to_order_quantity(
        qty in 1u64..10_000,
        ratio in 0.01..1.5_f64,
        side in arb_side(),
        price in arb_price(),
    ) {
        let exec = SimulatedExecution::new(ExecutionConfig {
            partial_fill_ratio: ratio,
            ..ExecutionConfig::default()
        })
        .unwrap();
        let order = OrderEvent::market(OrderId(7), "SPY", qty, side, 1.0);
        let fills = exec.execute(&order, &MarketEvent::new("SPY", price, 1.0));

        let total: u64 = fills.iter().map(|f| f.quantity).sum();
        prop_assert_eq!(total, qty);
        prop_assert!(fills.iter().all(|f| f.quantity >= 1));
        if ratio >= 1.0 {
            prop_assert_eq!(fills.len(), 1);
        }
        let first = fills[0].price;
        prop_assert!(fills.iter().all(|f| f.price == first && f.order_id == OrderId(7)));
    }

    #[test]
    fn unmarketable_limit_never_fills(
        qty in 1u64..1000,
        limit in arb_price(),
        gap in 0.01..50.0_f64,
    ) {
        let exec = SimulatedExecution::new(ExecutionConfig::frictionless()).unwrap();
        let buy = OrderEvent::limit(OrderId(1), "SPY", qty, OrderSide::Buy, limit, 1.0);
        prop_assert!(exec.execute(&buy, &MarketEvent::new("SPY", limit + gap, 1.0)).is_empty());
        let sell = OrderEvent::limit(OrderId(2), "SPY", qty, OrderSide::Sell, limit, 1.0);
        prop_assert!(exec.execute(&sell, &MarketEvent::new("SPY", limit - gap, 1.0)).is_empty());
    }
}

// ── 3. Determinism ───────────────────────────────────────────────────

fn replay(prices: &[f64]) -> BTreeMap<String, f64> {
    let events: Vec<MarketEvent> = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| MarketEvent::new("SPY", p, i as f64))
        .collect();
    let mut weights = BTreeMap::new();
    weights.insert("SPY".to_string(), 0.3);
    let mut host = StrategyHost::new(
        Box::new(StaticSignal::new(weights, SignalDirection::Long)),
        StrategySettings::default(),
    )
    .unwrap();
    host.attach_context(StrategyContext::new("static-signal", 1));
    let plan = SegmentPlan {
        segment_id: "segment-1".into(),
        events: &events,
        parameters: BTreeMap::new(),
        metadata: BTreeMap::new(),
    };
    let exec = SimulatedExecution::new(ExecutionConfig::default()).unwrap();
    let mut ledger = PortfolioLedger::with_cash("USD", 50_000.0);
    let result = run_segment(
        &plan,
        &mut host,
        &exec,
        &mut ledger,
        &mut OrderIdGenerator::new(),
        &RunLogger::detached(),
    )
    .unwrap();
    result.portfolio
}

proptest! {
    #[test]
    fn replay_is_deterministic(prices in prop::collection::vec(arb_price(), 1..40)) {
        prop_assert_eq!(replay(&prices), replay(&prices));
    }
}
