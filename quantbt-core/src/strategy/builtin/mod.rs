//! Built-in strategies.

pub mod mean_reversion;
pub mod momentum;
pub mod static_signal;

pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;
pub use static_signal::StaticSignal;

use std::collections::VecDeque;

/// Push onto a window, dropping the oldest values beyond `capacity`.
pub(crate) fn push_bounded(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    window.push_back(value);
    while window.len() > capacity {
        window.pop_front();
    }
}
