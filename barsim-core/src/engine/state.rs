//! Engine configuration and run result types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::broker::Rejection;
use super::translator::TradingMode;
use crate::components::params::{require_positive, ConfigError};
use crate::domain::{Fill, Position, Trade};

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub trading_mode: TradingMode,
    /// Force-close a position still open on the last bar (exit reason
    /// `EndOfData`). Off by default: the position is reported as open.
    pub close_at_end: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            trading_mode: TradingMode::LongShort,
            close_at_end: false,
        }
    }
}

impl EngineConfig {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            ..Self::default()
        }
    }

    pub fn with_trading_mode(mut self, trading_mode: TradingMode) -> Self {
        self.trading_mode = trading_mode;
        self
    }

    pub fn with_close_at_end(mut self, close_at_end: bool) -> Self {
        self.close_at_end = close_at_end;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("initial_cash", self.initial_cash)?;
        Ok(())
    }
}

/// Mark-to-market account value after a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// Result of a backtest run (complete, or partial when carried by an abort).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// One point per processed bar.
    pub equity_curve: Vec<EquityPoint>,
    /// Closed round trips in exit order.
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    /// Entries clamped or skipped for lack of cash.
    pub rejections: Vec<Rejection>,
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_equity: f64,
    /// Position still open after the last processed bar.
    pub open_position: Option<Position>,
    pub bar_count: usize,
    /// Bars that ended with a position open.
    pub bars_in_market: usize,
    pub total_commission: f64,
    /// Non-`None` strategy signals that reached the translator.
    pub signal_count: usize,
}

impl RunResult {
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}
