//! Trade: an immutable record of a closed position leg.

use super::position::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Strategy signal closed the position without reversing it.
    Signal,
    /// Closing leg of a long/short flip.
    Reversal,
    TrailingStop,
    TakeProfit,
    /// Force-closed on the last bar because the run was configured to do so.
    EndOfData,
}

/// A complete round trip: entry → exit.
///
/// Prices are reference (pre-commission) prices; `pnl` is net of both legs'
/// commission, so `pnl == (exit_price - entry_price) * signed_quantity - commission_paid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Size ──
    pub size: f64,
    pub signed_quantity: f64,

    // ── PnL ──
    pub pnl: f64,
    pub commission_paid: f64,
}

impl Trade {
    /// Net return as a fraction of the entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.size;
        if notional == 0.0 {
            return 0.0;
        }
        self.pnl / notional
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }

    pub fn gross_pnl(&self) -> f64 {
        (self.exit_price - self.entry_price) * self.signed_quantity
    }
}
