//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity values and/or trade list in, scalar
//! out. Percentages are reported on a 0–100 scale.

use serde::{Deserialize, Serialize};

use barsim_core::domain::Trade;
use barsim_core::engine::RunResult;

/// Summary statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return_pct: f64,
    /// Largest peak-to-trough decline, as a positive percentage.
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    pub trade_count: usize,
    pub sharpe: f64,
    pub profit_factor: f64,
    pub avg_trade_pnl: f64,
    /// Share of bars that ended with a position open.
    pub exposure_pct: f64,
    pub total_commission: f64,
    pub rejected_orders: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from a run. `annualization_factor` is the number
    /// of bars per year (252 for daily bars).
    pub fn compute(result: &RunResult, annualization_factor: f64) -> Self {
        let equity = result.equity_values();
        Self {
            total_return_pct: total_return_pct(result.initial_cash, result.final_equity),
            max_drawdown_pct: max_drawdown_pct(&equity),
            win_rate_pct: win_rate_pct(&result.trades),
            trade_count: result.trades.len(),
            sharpe: sharpe_ratio(&equity, annualization_factor),
            profit_factor: profit_factor(&result.trades),
            avg_trade_pnl: avg_trade_pnl(&result.trades),
            exposure_pct: exposure_pct(result.bars_in_market, result.bar_count),
            total_commission: result.total_commission,
            rejected_orders: result.rejections.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// `(final / initial − 1) × 100`. Zero when `initial` is not positive.
pub fn total_return_pct(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_equity / initial - 1.0) * 100.0
}

/// Maximum drawdown as a positive percentage (15.0 = a 15% decline).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd * 100.0
}

/// Annualized Sharpe ratio from per-bar returns, zero risk-free rate.
///
/// Sharpe = mean(returns) / std(returns) × sqrt(annualization_factor).
/// Returns 0.0 if variance is zero or there are fewer than two returns.
pub fn sharpe_ratio(equity_curve: &[f64], annualization_factor: f64) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std * annualization_factor.sqrt()
}

/// `winners / trades × 100`.
pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn avg_trade_pnl(trades: &[Trade]) -> f64 {
    let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
    mean_f64(&pnls)
}

pub fn exposure_pct(bars_in_market: usize, bar_count: usize) -> f64 {
    if bar_count == 0 {
        return 0.0;
    }
    bars_in_market as f64 / bar_count as f64 * 100.0
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity points.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
