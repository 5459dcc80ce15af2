//! Short-period RSI threshold crossing (Connors-style RSI-2 mean reversion).
//!
//! Buy when RSI drops through the oversold line, sell when it rises through
//! the overbought line.

use std::collections::BTreeMap;

use super::{Strategy, StrategyError};
use crate::components::params::{param, period_param, require_range, ConfigError};
use crate::domain::{Bar, Signal};
use crate::fingerprint::ComponentConfig;
use crate::indicators::rsi;

#[derive(Debug, Clone)]
pub struct RsiThreshold {
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiThreshold {
    pub fn new(rsi_period: usize, oversold: f64, overbought: f64) -> Result<Self, ConfigError> {
        if rsi_period == 0 {
            return Err(ConfigError::NonPositive {
                name: "rsi_period".into(),
                value: 0.0,
            });
        }
        require_range("oversold", oversold, 0.0, 100.0)?;
        require_range("overbought", overbought, oversold, 100.0)?;
        Ok(Self {
            rsi_period,
            oversold,
            overbought,
        })
    }

    pub fn from_config(config: &ComponentConfig) -> Result<Self, ConfigError> {
        Self::new(
            period_param(config, "rsi_period", 2)?,
            param(config, "oversold", 10.0),
            param(config, "overbought", 90.0),
        )
    }
}

impl Strategy for RsiThreshold {
    fn name(&self) -> &str {
        "rsi_threshold"
    }

    fn warmup_bars(&self) -> usize {
        self.rsi_period.saturating_add(2)
    }

    fn evaluate(&self, window: &[Bar]) -> Result<Signal, StrategyError> {
        if window.len() < self.warmup_bars() {
            return Ok(Signal::None);
        }
        let end = window.len();
        let (Some(prev), Some(cur)) = (
            rsi(window, end - 1, self.rsi_period),
            rsi(window, end, self.rsi_period),
        ) else {
            return Ok(Signal::None);
        };

        if prev >= self.oversold && cur < self.oversold {
            Ok(Signal::Buy)
        } else if prev <= self.overbought && cur > self.overbought {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::None)
        }
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("rsi_period".to_string(), self.rsi_period as f64),
            ("oversold".to_string(), self.oversold),
            ("overbought".to_string(), self.overbought),
        ])
    }
}
