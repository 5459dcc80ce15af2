//! Backtest runner: wires together config, data, engine and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads bars from the configured CSV, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded bars. Used by the benchmark and tests.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use barsim_core::components::{ConfigError, StrategyRegistry};
use barsim_core::domain::{Position, Trade};
use barsim_core::engine::{run_backtest, EngineError, EquityPoint, Rejection, TradingMode};
use barsim_core::fingerprint::StrategyConfig;

use crate::config::BacktestConfig;
use crate::data_loader::{load_csv, LoadError, LoadedBars};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("no bar data: set [backtest].data or pass a data file")]
    NoData,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// `StrategyConfig::full_hash()` of the run's strategy and risk knobs.
    pub run_id: String,
    pub config: StrategyConfig,
    pub commission_model: String,
    pub trading_mode: TradingMode,
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_equity: f64,
    pub data_source: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub signal_count: usize,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub rejections: Vec<Rejection>,
    /// Position left open on the last bar (`close_at_end = false`).
    pub open_position: Option<Position>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a single backtest from a `BacktestConfig`, loading bars from CSV.
///
/// `data_override` takes precedence over `[backtest].data`.
pub fn run_single_backtest(
    config: &BacktestConfig,
    data_override: Option<&Path>,
    registry: &StrategyRegistry,
) -> Result<BacktestResult, RunError> {
    let path = data_override
        .or(config.backtest.data.as_deref())
        .ok_or(RunError::NoData)?;
    let data = load_csv(path)?;
    run_backtest_from_data(config, &data, registry)
}

/// Run a backtest with pre-loaded bars: no I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    data: &LoadedBars,
    registry: &StrategyRegistry,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let overlay = config.build_overlay(registry)?;
    let commission = config.commission.build()?;
    let commission_model = commission.name().to_string();
    let strategy_config = config.strategy_config();
    let run_id = strategy_config.full_hash();

    info!(
        run_id = %run_id,
        strategy = %config.strategy.component_type,
        commission = %commission_model,
        source = %data.source,
        bars = data.bars.len(),
        "starting backtest"
    );

    let result = run_backtest(&data.bars, &overlay, commission, &config.engine_config())?;
    let metrics = PerformanceMetrics::compute(&result, config.backtest.annualization_factor);

    info!(
        run_id = %run_id,
        trades = metrics.trade_count,
        total_return_pct = metrics.total_return_pct,
        sharpe = metrics.sharpe,
        rejected = metrics.rejected_orders,
        "backtest finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: strategy_config,
        commission_model,
        trading_mode: config.backtest.trading_mode,
        initial_cash: result.initial_cash,
        final_cash: result.final_cash,
        final_equity: result.final_equity,
        data_source: data.source.clone(),
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.synthetic,
        start: data.bars.first().map(|b| b.timestamp),
        end: data.bars.last().map(|b| b.timestamp),
        bar_count: result.bar_count,
        warmup_bars: overlay.warmup_bars(),
        signal_count: result.signal_count,
        metrics,
        trades: result.trades,
        equity_curve: result.equity_curve,
        rejections: result.rejections,
        open_position: result.open_position,
    })
}
