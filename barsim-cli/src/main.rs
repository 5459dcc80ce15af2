//! barsim CLI: run, benchmark and strategy listing commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file
//! - `benchmark`: run every reference strategy on one data set, ranked by Sharpe
//! - `strategies`: list registered strategies and their default parameters
//!
//! Logging goes through `tracing`; set `RUST_LOG` (e.g. `RUST_LOG=barsim_core=debug`)
//! to see fills and transitions.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use barsim_core::components::StrategyRegistry;
use barsim_core::fingerprint::ComponentConfig;
use barsim_runner::benchmark::{default_specs, run_benchmark, BenchmarkRow, BenchmarkSettings};
use barsim_runner::config::{BacktestConfig, CommissionConfig};
use barsim_runner::data_loader::{load_csv, load_synthetic, LoadedBars};
use barsim_runner::export::{export_benchmark_csv, save_artifacts};
use barsim_runner::runner::{run_backtest_from_data, BacktestResult};

#[derive(Parser)]
#[command(name = "barsim", about = "barsim: bar-driven backtest engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV bar file. Overrides `[backtest].data`.
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run every reference strategy on one data set and rank by Sharpe.
    Benchmark {
        /// CSV bar file.
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Starting cash for every run.
        #[arg(long, default_value_t = 10_000.0)]
        cash: f64,

        /// Commission model: none, ibkr_pro, or fixed_rate:<rate>.
        #[arg(long, default_value = "ibkr_pro")]
        commission: CommissionConfig,

        /// Bars per year for Sharpe annualization.
        #[arg(long, default_value_t = 252.0)]
        annualization_factor: f64,

        /// Also write the ranked table to this CSV file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List registered strategies and their default parameters.
    Strategies,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = StrategyRegistry::with_builtins();

    match cli.command {
        Commands::Run {
            config,
            data,
            synthetic,
            seed,
            output_dir,
        } => run_backtest_cmd(&registry, &config, data, synthetic, seed, &output_dir),
        Commands::Benchmark {
            data,
            synthetic,
            seed,
            cash,
            commission,
            annualization_factor,
            output,
        } => {
            let settings = BenchmarkSettings {
                initial_cash: cash,
                commission,
                annualization_factor,
                ..BenchmarkSettings::default()
            };
            run_benchmark_cmd(&registry, data, synthetic, seed, &settings, output)
        }
        Commands::Strategies => list_strategies(&registry),
    }
}

fn load_data(path: Option<&Path>, synthetic: Option<usize>, seed: u64) -> Result<LoadedBars> {
    match (path, synthetic) {
        (_, Some(count)) => Ok(load_synthetic(count, seed)),
        (Some(path), None) => {
            load_csv(path).with_context(|| format!("failed to load bars from {}", path.display()))
        }
        (None, None) => bail!("no bar data: pass --data <csv> or --synthetic <bars>"),
    }
}

fn run_backtest_cmd(
    registry: &StrategyRegistry,
    config_path: &Path,
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    output_dir: &Path,
) -> Result<()> {
    let config = BacktestConfig::load(config_path)
        .with_context(|| format!("invalid config {}", config_path.display()))?;

    let data_path = data.or_else(|| config.backtest.data.clone());
    let bars = load_data(data_path.as_deref(), synthetic, seed)?;

    let result = run_backtest_from_data(&config, &bars, registry).context("backtest failed")?;
    print_summary(&result);

    let run_dir = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_benchmark_cmd(
    registry: &StrategyRegistry,
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    settings: &BenchmarkSettings,
    output: Option<PathBuf>,
) -> Result<()> {
    let bars = load_data(data.as_deref(), synthetic, seed)?;
    let rows = run_benchmark(&default_specs(), &bars, settings, registry)
        .context("benchmark failed")?;
    print_benchmark(&rows, &bars);

    if let Some(path) = output {
        let table = export_benchmark_csv(&rows)?;
        std::fs::write(&path, table)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Benchmark table saved to: {}", path.display());
    }
    Ok(())
}

fn list_strategies(registry: &StrategyRegistry) -> Result<()> {
    println!("{:<16} {:>7}  defaults", "strategy", "warmup");
    for id in registry.ids() {
        let strategy = registry.create(&ComponentConfig::new(id))?;
        let params: Vec<String> = strategy
            .params()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!(
            "{:<16} {:>7}  {}",
            id,
            strategy.warmup_bars(),
            params.join(", ")
        );
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.config.strategy.component_type);
    println!("Run ID:         {}", result.run_id);
    println!("Data:           {}", result.data_source);
    if let (Some(start), Some(end)) = (result.start, result.end) {
        println!("Period:         {start} to {end}");
    }
    println!(
        "Bars:           {} ({} warmup)",
        result.bar_count, result.warmup_bars
    );
    println!("Signals:        {}", result.signal_count);
    println!("Trades:         {}", m.trade_count);
    println!("Commission:     {} ({:.2})", result.commission_model, m.total_commission);
    println!();
    println!("--- Performance ---");
    println!("Final Equity:   {:.2}", result.final_equity);
    println!("Total Return:   {:.2}%", m.total_return_pct);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown_pct);
    println!("Win Rate:       {:.1}%", m.win_rate_pct);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Avg Trade PnL:  {:.2}", m.avg_trade_pnl);
    println!("Exposure:       {:.1}%", m.exposure_pct);
    if m.rejected_orders > 0 {
        println!("Rejected:       {}", m.rejected_orders);
    }
    if let Some(position) = &result.open_position {
        println!(
            "Open Position:  {:?} {} @ {:.2} since bar {}",
            position.side, position.size, position.entry_price, position.entry_bar
        );
    }
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

fn print_benchmark(rows: &[BenchmarkRow], bars: &LoadedBars) {
    println!();
    println!("=== Benchmark ({} bars from {}) ===", bars.bars.len(), bars.source);
    println!(
        "{:<22} {:>9} {:>8} {:>9} {:>9} {:>8}",
        "Strategy", "Return %", "Sharpe", "Max DD %", "Win %", "Trades"
    );
    for row in rows {
        let m = &row.metrics;
        println!(
            "{:<22} {:>9.2} {:>8.3} {:>9.2} {:>9.1} {:>8}",
            row.label,
            m.total_return_pct,
            m.sharpe,
            m.max_drawdown_pct,
            m.win_rate_pct,
            m.trade_count
        );
    }
    if bars.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
