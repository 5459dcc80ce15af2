//! Strategies: per-bar signal sources.
//!
//! A strategy sees only the bar window up to and including the current bar and
//! never sees position or account state. It must return `Signal::None` while
//! its lookback is not yet satisfied.

pub mod bollinger;
pub mod ma_crossover;
pub mod rsi_threshold;

pub use bollinger::BollingerReversion;
pub use ma_crossover::MaCrossover;
pub use rsi_threshold::RsiThreshold;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{Bar, Signal};

/// Raised by a strategy that cannot evaluate a bar. Fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("strategy {strategy} failed: {reason}")]
    Failed { strategy: String, reason: String },
}

/// Trait for signal sources.
///
/// `window` is `bars[..=t]`; the last element is the current bar. The output
/// must depend only on `window` and the strategy's fixed parameters.
pub trait Strategy: Send + Sync {
    /// Registry identifier (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Minimum window length before a signal can fire.
    fn warmup_bars(&self) -> usize;

    fn evaluate(&self, window: &[Bar]) -> Result<Signal, StrategyError>;

    /// Effective parameters, for reports.
    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }
}

/// Never signals. Useful for isolating the risk overlay and broker in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStrategy;

impl Strategy for NullStrategy {
    fn name(&self) -> &str {
        "null"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, _window: &[Bar]) -> Result<Signal, StrategyError> {
        Ok(Signal::None)
    }
}

/// Cross detection shared by the reference strategies.
///
/// Fires when `prev_a <= prev_b && cur_a > cur_b` (upward) or
/// `prev_a >= prev_b && cur_a < cur_b` (downward). A tie on the current bar
/// never fires, so a pair that touches and separates signals once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cross {
    Above,
    Below,
}

pub(crate) fn detect_cross(prev_a: f64, prev_b: f64, cur_a: f64, cur_b: f64) -> Option<Cross> {
    if prev_a <= prev_b && cur_a > cur_b {
        Some(Cross::Above)
    } else if prev_a >= prev_b && cur_a < cur_b {
        Some(Cross::Below)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_requires_strict_current_separation() {
        assert_eq!(detect_cross(1.0, 2.0, 3.0, 2.0), Some(Cross::Above));
        assert_eq!(detect_cross(2.0, 2.0, 3.0, 2.0), Some(Cross::Above));
        assert_eq!(detect_cross(1.0, 2.0, 2.0, 2.0), None);
        assert_eq!(detect_cross(3.0, 2.0, 1.0, 2.0), Some(Cross::Below));
        assert_eq!(detect_cross(3.0, 2.0, 4.0, 2.0), None);
    }

    #[test]
    fn null_strategy_never_signals() {
        let bars = crate::indicators::make_bars(&[1.0, 2.0, 3.0]);
        assert_eq!(NullStrategy.evaluate(&bars), Ok(Signal::None));
    }
}
