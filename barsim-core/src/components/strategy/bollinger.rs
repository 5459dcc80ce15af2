//! Bollinger band mean reversion.
//!
//! Buys when the close breaks down through the lower band and sells when it
//! recovers through the middle band.

use std::collections::BTreeMap;

use super::{detect_cross, Cross, Strategy, StrategyError};
use crate::components::params::{param, period_param, require_positive, ConfigError};
use crate::domain::{Bar, Signal};
use crate::fingerprint::ComponentConfig;
use crate::indicators::bollinger;

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    pub period: usize,
    pub std_dev: f64,
}

impl BollingerReversion {
    pub fn new(period: usize, std_dev: f64) -> Result<Self, ConfigError> {
        if period < 2 {
            return Err(ConfigError::OutOfRange {
                name: "period".into(),
                value: period as f64,
                min: 2.0,
                max: f64::MAX,
            });
        }
        require_positive("std_dev", std_dev)?;
        Ok(Self { period, std_dev })
    }

    pub fn from_config(config: &ComponentConfig) -> Result<Self, ConfigError> {
        Self::new(
            period_param(config, "period", 20)?,
            param(config, "std_dev", 2.0),
        )
    }
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn warmup_bars(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn evaluate(&self, window: &[Bar]) -> Result<Signal, StrategyError> {
        if window.len() < self.warmup_bars() {
            return Ok(Signal::None);
        }
        let end = window.len();
        let (Some(prev), Some(cur)) = (
            bollinger(window, end - 1, self.period, self.std_dev),
            bollinger(window, end, self.period, self.std_dev),
        ) else {
            return Ok(Signal::None);
        };
        let prev_close = window[end - 2].close;
        let close = window[end - 1].close;

        if detect_cross(prev_close, prev.lower, close, cur.lower) == Some(Cross::Below) {
            return Ok(Signal::Buy);
        }
        if detect_cross(prev_close, prev.middle, close, cur.middle) == Some(Cross::Above) {
            return Ok(Signal::Sell);
        }
        Ok(Signal::None)
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("period".to_string(), self.period as f64),
            ("std_dev".to_string(), self.std_dev),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn break_below_lower_band_buys() {
        let mut closes = vec![100.0, 101.0, 99.0, 100.0, 101.0, 99.0, 100.0];
        closes.push(80.0);
        let bars = make_bars(&closes);
        let strategy = BollingerReversion::new(5, 1.5).unwrap();
        assert_eq!(strategy.evaluate(&bars), Ok(Signal::Buy));
    }

    #[test]
    fn recovery_through_middle_sells() {
        // Previous close (90) sits under the previous middle (98), current close
        // (100) is above the current middle (98).
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0, 100.0, 90.0, 100.0]);
        let strategy = BollingerReversion::new(5, 2.0).unwrap();
        assert_eq!(strategy.evaluate(&bars), Ok(Signal::Sell));
    }

    #[test]
    fn warmup_returns_none() {
        let bars = make_bars(&[100.0; 5]);
        let strategy = BollingerReversion::new(5, 2.0).unwrap();
        assert_eq!(strategy.evaluate(&bars), Ok(Signal::None));
    }

    #[test]
    fn rejects_degenerate_params() {
        assert!(BollingerReversion::new(1, 2.0).is_err());
        assert!(BollingerReversion::new(20, 0.0).is_err());
    }
}
