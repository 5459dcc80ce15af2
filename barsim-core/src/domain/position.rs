//! Position: the single directional exposure of a run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

/// State of the order translator's machine: flat, long or short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl From<Side> for PositionSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => PositionSide::Long,
            Side::Short => PositionSide::Short,
        }
    }
}

/// An open position. A flat book is represented by the absence of a `Position`.
///
/// `watermark` is the most favorable close since entry (highest for longs,
/// lowest for shorts). `stop_price` only ever tightens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    /// Positive unit count.
    pub size: f64,
    /// Reference (pre-commission) entry price.
    pub entry_price: f64,
    /// Commission paid on the opening fill.
    pub entry_commission: f64,
    pub entry_time: NaiveDateTime,
    pub entry_bar: usize,
    pub watermark: f64,
    pub stop_price: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Position {
    pub fn new(
        side: Side,
        size: f64,
        entry_price: f64,
        entry_commission: f64,
        entry_time: NaiveDateTime,
        entry_bar: usize,
    ) -> Self {
        debug_assert!(size > 0.0, "open position must have positive size");
        Self {
            side,
            size,
            entry_price,
            entry_commission,
            entry_time,
            entry_bar,
            watermark: entry_price,
            stop_price: None,
            take_profit: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    /// Size with the direction's sign: positive long, negative short.
    pub fn signed_quantity(&self) -> f64 {
        self.side.sign() * self.size
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.signed_quantity() * current_price
    }

    /// Mark-to-market pnl against the reference entry price, before commission.
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.signed_quantity() * (current_price - self.entry_price)
    }

    pub fn bars_held(&self, bar_index: usize) -> usize {
        bar_index.saturating_sub(self.entry_bar)
    }
}
