//! Deterministic synthetic price provider.
//!
//! Generates a weekday-only random walk for the requested range. The RNG is
//! seeded from BLAKE3(seed ‖ symbol), so the same symbol always yields the
//! same path regardless of which other symbols are generated.

use super::provider::{DataError, DataProvider, DataRequest, PriceRow};
use crate::rng::seed_from_hash;
use chrono::{Datelike, Duration, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
    /// Maximum absolute daily return.
    daily_range: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
            daily_range: 0.03,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.to_uppercase().as_bytes());
        StdRng::seed_from_u64(seed_from_hash(hasher.finalize()))
    }

    pub fn generate(&self, request: &DataRequest) -> Vec<PriceRow> {
        let mut rng = self.rng_for(&request.symbol);
        let mut rows = Vec::new();
        let mut price = self.start_price;
        let mut current = request.start;

        while current <= request.end {
            let weekday = current.weekday();
            if weekday == Weekday::Sat || weekday == Weekday::Sun {
                current += Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-self.daily_range..self.daily_range);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64) as f64;

            rows.push(PriceRow {
                timestamp: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += Duration::days(1);
        }
        rows
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<PriceRow>, DataError> {
        let rows = self.generate(request);
        if rows.is_empty() {
            return Err(DataError::provider(
                self.name(),
                "requested range contains no weekdays",
            ));
        }
        Ok(rows)
    }
}
