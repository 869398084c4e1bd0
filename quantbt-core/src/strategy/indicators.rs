//! Indicator cache and the small set of rolling indicators strategies use.

use std::collections::BTreeMap;

/// Per-strategy scratch storage: indicator name → key → value.
///
/// Keys are caller-defined (bar index, whole-second timestamp, ...). A fresh
/// cache is attached for every segment.
#[derive(Debug, Clone, Default)]
pub struct IndicatorCache {
    store: BTreeMap<String, BTreeMap<u64, f64>>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str, key: u64) -> Option<f64> {
        self.store.get(name).and_then(|s| s.get(&key)).copied()
    }

    pub fn set(&mut self, name: &str, key: u64, value: f64) -> f64 {
        self.store
            .entry(name.to_string())
            .or_default()
            .insert(key, value);
        value
    }

    /// Mutable access to one indicator's series, created on demand.
    pub fn series(&mut self, name: &str) -> &mut BTreeMap<u64, f64> {
        self.store.entry(name.to_string()).or_default()
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Mean of the last `window` values. 0.0 when empty or `window == 0`.
pub fn simple_moving_average(values: &[f64], window: usize) -> f64 {
    if values.is_empty() || window == 0 {
        return 0.0;
    }
    let tail = &values[values.len().saturating_sub(window)..];
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// EMA over the full series, seeded with the first value.
pub fn exponential_moving_average(values: &[f64], window: usize) -> f64 {
    let Some((&first, rest)) = values.split_first() else {
        return 0.0;
    };
    if window == 0 {
        return 0.0;
    }
    let alpha = 2.0 / (window as f64 + 1.0);
    rest.iter()
        .fold(first, |ema, &v| alpha * v + (1.0 - alpha) * ema)
}

/// Population standard deviation of `values`. 0.0 when empty.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Wilder-style RSI over the last `window` changes.
///
/// Returns 50.0 with fewer than `window + 1` values and 100.0 when there are
/// no losses in the window.
pub fn relative_strength_index(values: &[f64], window: usize) -> f64 {
    if window == 0 || values.len() < window + 1 {
        return 50.0;
    }
    let tail = &values[values.len() - window - 1..];
    let (gains, losses) = tail.windows(2).fold((0.0, 0.0), |(g, l), pair| {
        let change = pair[1] - pair[0];
        if change >= 0.0 {
            (g + change, l)
        } else {
            (g, l - change)
        }
    });
    let avg_gain = gains / window as f64;
    let avg_loss = losses / window as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
