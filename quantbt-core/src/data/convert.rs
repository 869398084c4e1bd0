//! Price rows to engine market events.

use super::provider::PriceRow;
use crate::domain::MarketEvent;
use std::collections::BTreeMap;

/// One close-price market event per row, with the rest of the bar in
/// metadata.
pub fn rows_to_market_events(symbol: &str, rows: &[PriceRow]) -> Vec<MarketEvent> {
    rows.iter()
        .map(|row| {
            let metadata = BTreeMap::from([
                ("open".to_string(), row.open),
                ("high".to_string(), row.high),
                ("low".to_string(), row.low),
                ("volume".to_string(), row.volume),
            ]);
            MarketEvent::new(symbol, row.close, row.timestamp.timestamp() as f64)
                .with_metadata(metadata)
        })
        .collect()
}
