//! Integration tests for the segment loop driven by the scheduler.
//!
//! Tests:
//! 1. Determinism: same input and configuration give identical fills
//! 2. Warm-up gating through the host
//! 3. Walk-forward windows and ids
//! 4. Grid fan-out over the full sequence with a shared ledger
//! 5. Realized PnL on reduce and on flip

use quantbt_core::domain::{
    FillEvent, MarketEvent, OrderId, OrderIdGenerator, OrderSide, SignalDirection,
};
use quantbt_core::engine::{
    run_segment, EngineMode, EngineSegmentResult, RunScheduler, SchedulerConfig,
};
use quantbt_core::execution::{ExecutionConfig, SimulatedExecution};
use quantbt_core::logging::RunLogger;
use quantbt_core::portfolio::PortfolioLedger;
use quantbt_core::strategy::host::param;
use quantbt_core::strategy::{
    Momentum, StaticSignal, Strategy, StrategyContext, StrategyHost, StrategySettings,
};
use std::collections::BTreeMap;

fn wave(n: usize) -> Vec<MarketEvent> {
    (0..n)
        .map(|i| MarketEvent::new("AAPL", 100.0 + (i as f64 * 0.4).sin() * 5.0, i as f64))
        .collect()
}

fn static_signal(weight: f64) -> Box<dyn Strategy> {
    let mut weights = BTreeMap::new();
    weights.insert("AAPL".to_string(), weight);
    Box::new(StaticSignal::new(weights, SignalDirection::Long))
}

/// Drive every planned segment the way the runner does.
fn run_all(
    strategy: Box<dyn Strategy>,
    config: SchedulerConfig,
    execution: ExecutionConfig,
    events: &[MarketEvent],
) -> (Vec<EngineSegmentResult>, PortfolioLedger) {
    let mut host = StrategyHost::new(strategy, StrategySettings::default()).unwrap();
    let exec = SimulatedExecution::new(execution).unwrap();
    let mut ledger = PortfolioLedger::with_cash("USD", 100_000.0);
    let mut ids = OrderIdGenerator::new();
    let logger = RunLogger::detached();

    let mut results = Vec::new();
    for plan in RunScheduler::new(config).plan(events) {
        host.attach_context(StrategyContext::new(host.name().to_string(), 42));
        host.apply_parameters(&plan.parameters).unwrap();
        host.initialize_segment(&plan.segment_id, &plan.metadata);
        results.push(run_segment(&plan, &mut host, &exec, &mut ledger, &mut ids, &logger).unwrap());
    }
    (results, ledger)
}

#[test]
fn identical_runs_are_identical() {
    let events = wave(60);
    let config = SchedulerConfig {
        mode: EngineMode::WalkForward,
        walk_forward_window: 15,
        ..SchedulerConfig::default()
    };
    let momentum = || -> Box<dyn Strategy> { Box::new(Momentum::new(3, 0.001).unwrap()) };

    let (a, ledger_a) = run_all(momentum(), config.clone(), ExecutionConfig::default(), &events);
    let (b, ledger_b) = run_all(momentum(), config, ExecutionConfig::default(), &events);

    let fills_a: Vec<&FillEvent> = a.iter().flat_map(|s| s.fills.iter()).collect();
    let fills_b: Vec<&FillEvent> = b.iter().flat_map(|s| s.fills.iter()).collect();
    assert!(!fills_a.is_empty());
    assert_eq!(fills_a, fills_b);
    assert_eq!(ledger_a.snapshot(), ledger_b.snapshot());
}

#[test]
fn warmup_suppresses_early_signals() {
    let settings = StrategySettings {
        warmup_bars: 2,
        ..StrategySettings::default()
    };
    let mut host = StrategyHost::new(static_signal(0.5), settings).unwrap();
    host.attach_context(StrategyContext::new("static-signal", 0));
    host.initialize_segment("segment-1", &BTreeMap::new());
    let ledger = PortfolioLedger::new("USD");

    let counts: Vec<usize> = (1..=3)
        .map(|t| {
            host.on_market_data(&MarketEvent::new("AAPL", 10.0, t as f64), &ledger)
                .unwrap()
                .len()
        })
        .collect();
    assert_eq!(counts, [0, 0, 1]);
}

#[test]
fn walk_forward_windows() {
    let events = wave(9);
    for (window, expected) in [(3, vec![3, 3, 3]), (4, vec![4, 4, 1])] {
        let config = SchedulerConfig {
            mode: EngineMode::WalkForward,
            walk_forward_window: window,
            ..SchedulerConfig::default()
        };
        let plans = RunScheduler::new(config).plan(&events);
        let sizes: Vec<usize> = plans.iter().map(|p| p.events.len()).collect();
        assert_eq!(sizes, expected);
        assert_eq!(plans[0].segment_id, "wf-1");
    }
}

#[test]
fn grid_legs_replay_everything_on_one_ledger() {
    let events = wave(4);
    let config = SchedulerConfig {
        mode: EngineMode::GridSearch,
        grid: vec![param("direction", "LONG"), param("direction", "SHORT")],
        ..SchedulerConfig::default()
    };
    let (results, ledger) = run_all(
        static_signal(0.5),
        config,
        ExecutionConfig::frictionless(),
        &events,
    );

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].segment_id, "grid-1");
    assert_eq!(results[1].segment_id, "grid-2");
    // Four signals of 50 shares per leg.
    assert_eq!(results[0].fill_count, 4);
    assert_eq!(results[0].portfolio["AAPL"], 200.0);
    assert_eq!(results[1].portfolio["AAPL"], 0.0);
    assert!(results[1].fills.iter().all(|f| f.side == OrderSide::Sell));
    assert_eq!(results[1].parameters, param("direction", "SHORT"));
    // Both legs fill at the same last price, so the round trip is flat.
    assert!((ledger.equity() - 100_000.0).abs() < 1e-6);
}

fn fill(qty: u64, side: OrderSide, price: f64) -> FillEvent {
    FillEvent {
        order_id: OrderId(1),
        symbol: "AAPL".into(),
        quantity: qty,
        side,
        price,
        commission: 0.0,
        slippage_bps: 0.0,
        spread_bps: 0.0,
        timestamp: 0.0,
    }
}

#[test]
fn reduce_then_flip_realizes_pnl() {
    let mut ledger = PortfolioLedger::with_cash("USD", 10_000.0);
    ledger.apply_fill(&fill(50, OrderSide::Buy, 100.0));
    ledger.apply_fill(&fill(30, OrderSide::Sell, 110.0));

    let pos = ledger.position("AAPL").unwrap();
    assert_eq!(pos.quantity, 20.0);
    assert_eq!(pos.avg_cost, 100.0);
    assert!((ledger.realized_pnl() - 300.0).abs() < 1e-9);

    ledger.apply_fill(&fill(40, OrderSide::Sell, 120.0));
    let pos = ledger.position("AAPL").unwrap();
    assert_eq!(pos.quantity, -20.0);
    assert_eq!(pos.avg_cost, 120.0);
    assert!((ledger.realized_pnl() - 700.0).abs() < 1e-9);
}
