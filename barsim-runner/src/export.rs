//! Export: JSON manifest and CSV artifacts.
//!
//! - **JSON**: full `BacktestResult` with schema versioning
//! - **CSV**: trade tape, equity curve and benchmark table
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use barsim_core::domain::Trade;
use barsim_core::engine::EquityPoint;

use crate::benchmark::BenchmarkRow;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: side, entry_bar, entry_time, entry_price, exit_bar, exit_time,
/// exit_price, exit_reason, size, gross_pnl, commission, pnl, return_pct, bars_held
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "entry_bar",
        "entry_time",
        "entry_price",
        "exit_bar",
        "exit_time",
        "exit_price",
        "exit_reason",
        "size",
        "gross_pnl",
        "commission",
        "pnl",
        "return_pct",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.side),
            &t.entry_bar.to_string(),
            &t.entry_time.format(TIME_FORMAT).to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_time.format(TIME_FORMAT).to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:?}", t.exit_reason),
            &format!("{}", t.size),
            &format!("{:.2}", t.gross_pnl()),
            &format!("{:.2}", t.commission_paid),
            &format!("{:.2}", t.pnl),
            &format!("{:.4}", t.return_pct() * 100.0),
            &t.bars_held().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: bar_index, timestamp, equity
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "timestamp", "equity"])?;
    for (i, point) in equity_curve.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &point.timestamp.format(TIME_FORMAT).to_string(),
            &format!("{:.2}", point.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Benchmark table in ranked order.
pub fn export_benchmark_csv(rows: &[BenchmarkRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "strategy",
        "return_pct",
        "sharpe",
        "max_drawdown_pct",
        "win_rate_pct",
        "trades",
    ])?;
    for row in rows {
        let m = &row.metrics;
        wtr.write_record([
            &row.label,
            &format!("{:.2}", m.total_return_pct),
            &format!("{:.4}", m.sharpe),
            &format!("{:.2}", m.max_drawdown_pct),
            &format!("{:.2}", m.win_rate_pct),
            &m.trade_count.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{strategy}_{run_id prefix}/` under `output_dir` containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `trades.csv`: trade tape
/// - `equity.csv`: bar-by-bar equity curve
///
/// Returns the path to the created directory. Re-running the same
/// configuration overwrites its artifacts.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = result.run_id.chars().take(12).collect();
    let dirname = format!("{}_{}", result.config.strategy.component_type, short_id);
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    write_file(&run_dir.join("manifest.json"), &json)?;

    let trades_csv = export_trades_csv(&result.trades)?;
    write_file(&run_dir.join("trades.csv"), &trades_csv)?;

    let equity_csv = export_equity_csv(&result.equity_curve)?;
    write_file(&run_dir.join("equity.csv"), &equity_csv)?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
