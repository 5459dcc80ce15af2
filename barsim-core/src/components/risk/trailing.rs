//! Exit levels: trailing stop, fixed take-profit, and the per-bar breach check.
//!
//! For longs: stop = watermark * (1 - trail_pct), target = entry * (1 + tp_pct).
//! For shorts: stop = watermark * (1 + trail_pct), target = entry * (1 - tp_pct).
//!
//! Stops only ever tighten; `ratchet` clamps any proposal that would loosen.

use crate::domain::{Bar, ExitReason, Position, Side};

/// A close forced by the risk overlay, overriding the strategy for the bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcedExit {
    pub reason: ExitReason,
    /// Reference price for the closing fill.
    pub price: f64,
}

/// New watermark and stop after a bar without a forced exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailUpdate {
    pub watermark: f64,
    pub stop_price: Option<f64>,
}

/// Raw trailing-stop level for `watermark`. `None` when trailing is disabled.
pub fn trailing_stop(side: Side, watermark: f64, trail_pct: f64) -> Option<f64> {
    if trail_pct <= 0.0 {
        return None;
    }
    Some(match side {
        Side::Long => watermark * (1.0 - trail_pct),
        Side::Short => watermark * (1.0 + trail_pct),
    })
}

/// Fixed take-profit level. `None` when `take_profit_pct == 0`.
pub fn take_profit_level(side: Side, entry_price: f64, take_profit_pct: f64) -> Option<f64> {
    if take_profit_pct <= 0.0 {
        return None;
    }
    Some(match side {
        Side::Long => entry_price * (1.0 + take_profit_pct),
        Side::Short => entry_price * (1.0 - take_profit_pct),
    })
}

/// Most favorable close seen so far.
pub fn advance_watermark(side: Side, watermark: f64, close: f64) -> f64 {
    match side {
        Side::Long => watermark.max(close),
        Side::Short => watermark.min(close),
    }
}

/// Clamp a proposed stop so it never loosens relative to `current`.
pub fn ratchet(side: Side, current: Option<f64>, proposed: Option<f64>) -> Option<f64> {
    match (current, proposed) {
        (Some(cur), Some(new)) => Some(match side {
            Side::Long => new.max(cur),
            Side::Short => new.min(cur),
        }),
        (cur, None) => cur,
        (None, new) => new,
    }
}

/// Check whether `bar` breaches the position's stop or target.
///
/// The stop is tested against the adverse extreme and wins when both levels
/// are touched in the same bar. A bar that opens beyond a level fills at the
/// open instead of the level.
pub fn check_exits(position: &Position, bar: &Bar) -> Option<ForcedExit> {
    if let Some(stop) = position.stop_price {
        let breached = match position.side {
            Side::Long => bar.low <= stop,
            Side::Short => bar.high >= stop,
        };
        if breached {
            let price = match position.side {
                Side::Long => bar.open.min(stop),
                Side::Short => bar.open.max(stop),
            };
            return Some(ForcedExit {
                reason: ExitReason::TrailingStop,
                price,
            });
        }
    }

    if let Some(target) = position.take_profit {
        let reached = match position.side {
            Side::Long => bar.high >= target,
            Side::Short => bar.low <= target,
        };
        if reached {
            let price = match position.side {
                Side::Long => bar.open.max(target),
                Side::Short => bar.open.min(target),
            };
            return Some(ForcedExit {
                reason: ExitReason::TakeProfit,
                price,
            });
        }
    }

    None
}
