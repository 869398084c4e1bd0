//! Segment loop — drains one segment's event queue against the shared ledger.

use super::modes::{EngineSegmentResult, SegmentPlan};
use super::queue::EventQueue;
use crate::domain::{Event, FillEvent, MarketEvent, OrderEvent, OrderIdGenerator};
use crate::execution::ExecutionHandler;
use crate::logging::RunLogger;
use crate::portfolio::PortfolioLedger;
use crate::strategy::{StrategyError, StrategyHost};
use std::collections::HashMap;
use std::time::Instant;

/// Run one segment.
///
/// The ledger and the order id generator are owned by the caller and carry
/// over between segments. Orders for a symbol with no market observation yet
/// are dropped; LIMIT orders that do not fill are dropped as well.
pub fn run_segment(
    plan: &SegmentPlan<'_>,
    host: &mut StrategyHost,
    execution: &dyn ExecutionHandler,
    ledger: &mut PortfolioLedger,
    order_ids: &mut OrderIdGenerator,
    logger: &RunLogger,
) -> Result<EngineSegmentResult, StrategyError> {
    let span = logger.segment_span(&plan.segment_id);
    let _enter = span.enter();
    let started = Instant::now();

    let mut queue = EventQueue::new();
    queue.extend(plan.events.iter().cloned().map(Event::Market));

    let mut latest: HashMap<String, MarketEvent> = HashMap::new();
    let mut fills: Vec<FillEvent> = Vec::new();
    let mut dropped_orders = 0usize;

    while let Some(event) = queue.pop() {
        match event {
            Event::Market(market) => {
                ledger.mark_price(&market.symbol, market.price);
                let signals = host.on_market_data(&market, ledger)?;
                for signal in &signals {
                    let order = OrderEvent::from_signal(order_ids.next_id(), signal, market.timestamp);
                    queue.push(Event::Order(order));
                }
                latest.insert(market.symbol.clone(), market);
            }
            Event::Signal(signal) => {
                let ts = signal.timestamp.unwrap_or_default();
                let order = OrderEvent::from_signal(order_ids.next_id(), &signal, ts);
                queue.push(Event::Order(order));
            }
            Event::Order(order) => {
                let Some(market) = latest.get(&order.symbol) else {
                    tracing::debug!(order_id = %order.order_id, symbol = %order.symbol, "no market price yet; order dropped");
                    dropped_orders += 1;
                    continue;
                };
                let produced = execution.execute(&order, market);
                if produced.is_empty() {
                    tracing::debug!(order_id = %order.order_id, "order produced no fills");
                    dropped_orders += 1;
                }
                for fill in produced {
                    ledger.apply_fill(&fill);
                    fills.push(fill);
                }
            }
            Event::Fill(fill) => {
                ledger.apply_fill(&fill);
                fills.push(fill);
            }
        }
    }

    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        events = plan.events.len(),
        fills = fills.len(),
        dropped_orders,
        equity = ledger.equity(),
        duration_ms,
        "segment complete"
    );

    Ok(EngineSegmentResult {
        segment_id: plan.segment_id.clone(),
        fill_count: fills.len(),
        fills,
        portfolio: ledger.snapshot(),
        parameters: plan.parameters.clone(),
        duration_ms,
    })
}
