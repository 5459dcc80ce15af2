//! Benchmark: every strategy over the same bars, ranked by Sharpe.
//!
//! Runs are independent and share the bars read-only, so they execute in
//! parallel with rayon.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use barsim_core::components::{RiskParams, StrategyRegistry};
use barsim_core::engine::TradingMode;
use barsim_core::fingerprint::ComponentConfig;

use crate::config::{BacktestConfig, BacktestSection, CommissionConfig};
use crate::data_loader::LoadedBars;
use crate::metrics::PerformanceMetrics;
use crate::runner::{run_backtest_from_data, RunError};

/// One strategy entry in a benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSpec {
    pub label: String,
    pub strategy: ComponentConfig,
    pub risk: RiskParams,
}

impl BenchmarkSpec {
    pub fn new(label: impl Into<String>, strategy: ComponentConfig) -> Self {
        Self {
            label: label.into(),
            strategy,
            risk: RiskParams::default(),
        }
    }
}

/// Settings shared by every run of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkSettings {
    pub initial_cash: f64,
    pub commission: CommissionConfig,
    pub trading_mode: TradingMode,
    pub annualization_factor: f64,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            commission: CommissionConfig::IbkrPro,
            trading_mode: TradingMode::LongShort,
            annualization_factor: 252.0,
        }
    }
}

/// One ranked result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRow {
    pub label: String,
    pub strategy: String,
    pub run_id: String,
    pub metrics: PerformanceMetrics,
}

/// The three reference strategies with their default parameters.
pub fn default_specs() -> Vec<BenchmarkSpec> {
    vec![
        BenchmarkSpec::new("Simple MA Crossover", ComponentConfig::new("ma_crossover")),
        BenchmarkSpec::new("RSI(2) Threshold", ComponentConfig::new("rsi_threshold")),
        BenchmarkSpec::new("Bollinger Bands", ComponentConfig::new("bollinger")),
    ]
}

/// Run every spec over `data` in parallel and sort rows by Sharpe, best first.
///
/// Any failing run fails the whole benchmark.
pub fn run_benchmark(
    specs: &[BenchmarkSpec],
    data: &LoadedBars,
    settings: &BenchmarkSettings,
    registry: &StrategyRegistry,
) -> Result<Vec<BenchmarkRow>, RunError> {
    if data.synthetic {
        warn!(source = %data.source, "benchmarking on synthetic data");
    }
    info!(runs = specs.len(), bars = data.bars.len(), "starting benchmark");

    let mut rows = specs
        .par_iter()
        .map(|spec| {
            let config = BacktestConfig {
                backtest: BacktestSection {
                    initial_cash: settings.initial_cash,
                    annualization_factor: settings.annualization_factor,
                    trading_mode: settings.trading_mode,
                    ..BacktestSection::default()
                },
                strategy: spec.strategy.clone(),
                risk: spec.risk,
                commission: settings.commission,
            };
            let result = run_backtest_from_data(&config, data, registry)?;
            Ok(BenchmarkRow {
                label: spec.label.clone(),
                strategy: spec.strategy.component_type.clone(),
                run_id: result.run_id,
                metrics: result.metrics,
            })
        })
        .collect::<Result<Vec<_>, RunError>>()?;

    rows.sort_by(|a, b| b.metrics.sharpe.total_cmp(&a.metrics.sharpe));
    Ok(rows)
}
