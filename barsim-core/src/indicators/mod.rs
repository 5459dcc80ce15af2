//! Rolling indicators over the visible bar window.
//!
//! Every function reads the `period` bars ending at `end` (exclusive), so a
//! strategy evaluating the window `bars[..=t]` computes its current value with
//! `end = t + 1` and the previous bar's value with `end = t`. Insufficient
//! history yields `None`, never a panic.

pub mod bollinger;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger, BollingerBands};
pub use rsi::rsi;
pub use sma::sma;

use crate::domain::Bar;

/// The `period` bars ending at `end` (exclusive), if that many exist.
pub(crate) fn trailing(bars: &[Bar], end: usize, period: usize) -> Option<&[Bar]> {
    if period == 0 || end > bars.len() || end < period {
        return None;
    }
    Some(&bars[end - period..end])
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close, high/low = max/min(open, close) ± 1, one day apart.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal.
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}",
        (actual - expected).abs()
    );
}
