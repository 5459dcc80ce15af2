//! Relative Strength Index with simple-average gains and losses.
//!
//! Uses the plain mean of the last `period` close-to-close changes rather than
//! Wilder smoothing, which keeps the value a pure function of `period + 1`
//! closes. A window with no losses has RS pinned to 100.

use super::trailing;
use crate::domain::Bar;

const RS_NO_LOSSES: f64 = 100.0;

/// RSI over the `period` deltas ending at `end` (exclusive). Needs `period + 1` bars.
pub fn rsi(bars: &[Bar], end: usize, period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let window = trailing(bars, end, period.checked_add(1)?)?;

    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1].close - pair[0].close)
        .fold((0.0, 0.0), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    let rs = if avg_loss == 0.0 {
        RS_NO_LOSSES
    } else {
        avg_gain / avg_loss
    };
    Some(100.0 - 100.0 / (1.0 + rs))
}
