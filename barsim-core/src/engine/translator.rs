//! Order translator: maps (position state, signal) to a position transition.
//!
//! | state | signal | transition |
//! |-------|--------|------------|
//! | flat  | buy    | open long  |
//! | flat  | sell   | open short |
//! | long  | sell   | close, then open short |
//! | short | buy    | close, then open long |
//! | long  | buy / short | sell | hold |
//! | any   | none   | hold |
//!
//! Trading modes that forbid one direction turn the corresponding opens into
//! plain closes (or holds when flat).

use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, PositionSide, Side, Signal};

/// Which directions a run may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    #[default]
    LongShort,
    LongOnly,
    ShortOnly,
}

impl TradingMode {
    pub fn allows(&self, side: Side) -> bool {
        match self {
            TradingMode::LongShort => true,
            TradingMode::LongOnly => side == Side::Long,
            TradingMode::ShortOnly => side == Side::Short,
        }
    }
}

/// A concrete position state change.
///
/// `Reverse` is never atomic: the broker executes it as a close followed by
/// an open on the same bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Hold,
    Open(Side),
    Close(ExitReason),
    Reverse(Side),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderTranslator {
    mode: TradingMode,
}

impl OrderTranslator {
    pub fn new(mode: TradingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TradingMode {
        self.mode
    }

    pub fn translate(&self, state: PositionSide, signal: Signal) -> Transition {
        let wanted = match signal {
            Signal::None => return Transition::Hold,
            Signal::Buy => Side::Long,
            Signal::Sell => Side::Short,
        };
        let may_open = self.mode.allows(wanted);

        match state {
            PositionSide::Flat if may_open => Transition::Open(wanted),
            PositionSide::Flat => Transition::Hold,
            held if held == PositionSide::from(wanted) => Transition::Hold,
            _ if may_open => Transition::Reverse(wanted),
            _ => Transition::Close(ExitReason::Signal),
        }
    }

    /// Transition for a stop/target/end-of-data exit. Flat stays flat.
    pub fn force_close(&self, state: PositionSide, reason: ExitReason) -> Transition {
        match state {
            PositionSide::Flat => Transition::Hold,
            _ => Transition::Close(reason),
        }
    }
}
