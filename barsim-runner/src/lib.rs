//! barsim runner: backtest orchestration on top of `barsim-core`.
//!
//! This crate provides:
//! - TOML configuration (`[backtest]`, `[strategy]`, `[risk]`, `[commission]`)
//! - CSV bar loading and seeded synthetic bars
//! - Single-backtest runner with metrics and run fingerprinting
//! - Parallel multi-strategy benchmark ranked by Sharpe
//! - JSON/CSV artifact export

pub mod benchmark;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use benchmark::{default_specs, run_benchmark, BenchmarkRow, BenchmarkSettings, BenchmarkSpec};
pub use config::{BacktestConfig, CommissionConfig, RunnerConfigError};
pub use data_loader::{load_csv, load_synthetic, LoadError, LoadedBars};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest_from_data, run_single_backtest, BacktestResult, RunError};
