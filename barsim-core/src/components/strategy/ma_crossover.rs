//! Moving average crossover: golden cross buys, death cross sells.

use std::collections::BTreeMap;

use super::{detect_cross, Cross, Strategy, StrategyError};
use crate::components::params::{period_param, ConfigError};
use crate::domain::{Bar, Signal};
use crate::fingerprint::ComponentConfig;
use crate::indicators::sma;

/// Fast/slow SMA crossover over closes.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, ConfigError> {
        if fast_period == 0 {
            return Err(ConfigError::NonPositive {
                name: "fast_period".into(),
                value: 0.0,
            });
        }
        if fast_period >= slow_period {
            return Err(ConfigError::PeriodOrder {
                fast: fast_period,
                slow: slow_period,
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }

    pub fn from_config(config: &ComponentConfig) -> Result<Self, ConfigError> {
        Self::new(
            period_param(config, "fast_period", 10)?,
            period_param(config, "slow_period", 20)?,
        )
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    /// The slow average on the previous bar needs `slow_period` bars before it.
    fn warmup_bars(&self) -> usize {
        self.slow_period.saturating_add(1)
    }

    fn evaluate(&self, window: &[Bar]) -> Result<Signal, StrategyError> {
        if window.len() < self.warmup_bars() {
            return Ok(Signal::None);
        }
        let end = window.len();
        let values = (
            sma(window, end - 1, self.fast_period),
            sma(window, end - 1, self.slow_period),
            sma(window, end, self.fast_period),
            sma(window, end, self.slow_period),
        );
        let (Some(prev_fast), Some(prev_slow), Some(fast), Some(slow)) = values else {
            return Ok(Signal::None);
        };

        Ok(match detect_cross(prev_fast, prev_slow, fast, slow) {
            Some(Cross::Above) => Signal::Buy,
            Some(Cross::Below) => Signal::Sell,
            None => Signal::None,
        })
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("fast_period".to_string(), self.fast_period as f64),
            ("slow_period".to_string(), self.slow_period as f64),
        ])
    }
}
