//! Simple moving average of closes.

use super::trailing;
use crate::domain::Bar;

/// Mean close of the `period` bars ending at `end` (exclusive).
pub fn sma(bars: &[Bar], end: usize, period: usize) -> Option<f64> {
    let window = trailing(bars, end, period)?;
    let sum: f64 = window.iter().map(|b| b.close).sum();
    Some(sum / period as f64)
}
