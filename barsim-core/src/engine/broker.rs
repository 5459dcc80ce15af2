//! Execution simulator: owns cash, the position and the ledger.
//!
//! Commission is folded into the fill price rather than debited separately:
//! `fill_price = reference_price + fee / signed_quantity`, so a buy pays a
//! little more per unit and a sell receives a little less. Cash moves by
//! `signed_quantity * fill_price`, which nets to exactly the same balance as a
//! separate fee line.
//!
//! The fee is estimated once per order from the order quantity and the
//! reference price, before the fill is booked.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::components::commission::{checked_fee, CommissionError, CommissionModel};
use crate::components::risk::TrailUpdate;
use crate::domain::{ExitReason, Fill, Position, PositionSide, Side, Trade};

/// How an entry was reduced for lack of cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Filled at a smaller, affordable size.
    Clamped,
    /// Not even one unit was affordable; no order was placed.
    Skipped,
}

/// An entry the broker could not fill as requested. Recoverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub side: Side,
    pub requested: f64,
    pub filled: f64,
    pub kind: RejectionKind,
}

/// Entry request handed to `Broker::open`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryOrder {
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub stop_price: Option<f64>,
    pub take_profit: Option<f64>,
}

/// Broker state at the start of a bar, used to undo a partially applied bar.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    cash: f64,
    position: Option<Position>,
    total_commission: f64,
    fills: usize,
    trades: usize,
    rejections: usize,
}

pub struct Broker {
    cash: f64,
    position: Option<Position>,
    commission: Box<dyn CommissionModel>,
    total_commission: f64,
    fills: Vec<Fill>,
    trades: Vec<Trade>,
    rejections: Vec<Rejection>,
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("cash", &self.cash)
            .field("position", &self.position)
            .field("commission", &self.commission.name())
            .field("trades", &self.trades.len())
            .finish_non_exhaustive()
    }
}

/// Commission-adjusted execution price.
pub fn adjusted_price(reference_price: f64, fee: f64, signed_quantity: f64) -> f64 {
    if signed_quantity == 0.0 {
        return reference_price;
    }
    reference_price + fee / signed_quantity
}

impl Broker {
    pub fn new(initial_cash: f64, commission: Box<dyn CommissionModel>) -> Self {
        Self {
            cash: initial_cash,
            position: None,
            commission,
            total_commission: 0.0,
            fills: Vec::new(),
            trades: Vec::new(),
            rejections: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn position_side(&self) -> PositionSide {
        self.position
            .as_ref()
            .map_or(PositionSide::Flat, |p| p.side.into())
    }

    /// Cash plus the open position marked at `mark_price`.
    pub fn equity(&self, mark_price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(mark_price))
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    pub fn commission_model(&self) -> &dyn CommissionModel {
        self.commission.as_ref()
    }

    /// Open a position, clamping the size to what cash covers.
    ///
    /// The requested quantity is first capped at `floor(cash / price)`. If the
    /// fee then pushes the cost over cash, the size is reduced once more to
    /// `floor((cash - fee) / price)`. An order that cannot afford one unit is
    /// skipped and recorded. Returns whether a position was opened.
    pub fn open(
        &mut self,
        order: EntryOrder,
        bar_index: usize,
        timestamp: NaiveDateTime,
    ) -> Result<bool, CommissionError> {
        debug_assert!(self.position.is_none(), "open called with a live position");
        let EntryOrder { side, price, .. } = order;
        let requested = order.quantity.floor().max(0.0);

        let mut quantity = requested.min((self.cash / price).floor()).max(0.0);
        let mut fee = 0.0;
        if quantity >= 1.0 {
            fee = checked_fee(self.commission.as_ref(), side.sign() * quantity, price)?;
            if quantity * price + fee > self.cash {
                quantity = ((self.cash - fee) / price).floor().max(0.0);
                if quantity >= 1.0 {
                    fee = checked_fee(self.commission.as_ref(), side.sign() * quantity, price)?;
                    if quantity * price + fee > self.cash {
                        quantity = 0.0;
                    }
                }
            }
        }

        if quantity < 1.0 {
            self.reject(side, requested, 0.0, RejectionKind::Skipped, bar_index, timestamp);
            return Ok(false);
        }
        if quantity < requested {
            self.reject(side, requested, quantity, RejectionKind::Clamped, bar_index, timestamp);
        }

        let signed_quantity = side.sign() * quantity;
        self.book_fill(bar_index, timestamp, signed_quantity, price, fee);

        let mut position = Position::new(side, quantity, price, fee, timestamp, bar_index);
        position.stop_price = order.stop_price;
        position.take_profit = order.take_profit;
        debug!(
            bar_index,
            ?side,
            quantity,
            price,
            fee,
            stop = ?position.stop_price,
            "opened position"
        );
        self.position = Some(position);
        Ok(true)
    }

    /// Close the open position at `price`, appending a trade. Flat is a no-op.
    pub fn close(
        &mut self,
        price: f64,
        bar_index: usize,
        timestamp: NaiveDateTime,
        reason: ExitReason,
    ) -> Result<Option<&Trade>, CommissionError> {
        let Some(open) = self.position.as_ref() else {
            return Ok(None);
        };
        let signed_quantity = -open.signed_quantity();
        let fee = checked_fee(self.commission.as_ref(), signed_quantity, price)?;

        let Some(position) = self.position.take() else {
            return Ok(None);
        };
        self.book_fill(bar_index, timestamp, signed_quantity, price, fee);

        let commission_paid = position.entry_commission + fee;
        let pnl = (price - position.entry_price) * position.signed_quantity() - commission_paid;
        debug!(bar_index, ?reason, price, pnl, "closed position");

        self.trades.push(Trade {
            side: position.side,
            entry_bar: position.entry_bar,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_bar: bar_index,
            exit_time: timestamp,
            exit_price: price,
            exit_reason: reason,
            size: position.size,
            signed_quantity: position.signed_quantity(),
            pnl,
            commission_paid,
        });
        Ok(self.trades.last())
    }

    /// Change the exit reason of the most recent trade.
    pub fn relabel_last_exit(&mut self, reason: ExitReason) {
        if let Some(trade) = self.trades.last_mut() {
            trade.exit_reason = reason;
        }
    }

    /// Move the watermark and stop of the open position.
    pub fn apply_trail(&mut self, update: TrailUpdate) {
        if let Some(position) = self.position.as_mut() {
            position.watermark = update.watermark;
            position.stop_price = update.stop_price;
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cash: self.cash,
            position: self.position.clone(),
            total_commission: self.total_commission,
            fills: self.fills.len(),
            trades: self.trades.len(),
            rejections: self.rejections.len(),
        }
    }

    /// Restore the state captured by `checkpoint`. Ledger entries appended
    /// since then are dropped.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.cash = checkpoint.cash;
        self.position = checkpoint.position;
        self.total_commission = checkpoint.total_commission;
        self.fills.truncate(checkpoint.fills);
        self.trades.truncate(checkpoint.trades);
        self.rejections.truncate(checkpoint.rejections);
    }

    /// Consume the broker, yielding (cash, open position, fills, trades, rejections).
    pub fn into_ledger(self) -> Ledger {
        Ledger {
            cash: self.cash,
            position: self.position,
            total_commission: self.total_commission,
            fills: self.fills,
            trades: self.trades,
            rejections: self.rejections,
        }
    }

    fn book_fill(
        &mut self,
        bar_index: usize,
        timestamp: NaiveDateTime,
        signed_quantity: f64,
        reference_price: f64,
        fee: f64,
    ) {
        let fill_price = adjusted_price(reference_price, fee, signed_quantity);
        self.cash -= signed_quantity * fill_price;
        self.total_commission += fee;
        self.fills.push(Fill {
            bar_index,
            timestamp,
            signed_quantity,
            reference_price,
            fill_price,
            commission: fee,
        });
    }

    fn reject(
        &mut self,
        side: Side,
        requested: f64,
        filled: f64,
        kind: RejectionKind,
        bar_index: usize,
        timestamp: NaiveDateTime,
    ) {
        warn!(
            bar_index,
            ?side,
            requested,
            filled,
            ?kind,
            cash = self.cash,
            "entry reduced for insufficient cash"
        );
        self.rejections.push(Rejection {
            bar_index,
            timestamp,
            side,
            requested,
            filled,
            kind,
        });
    }
}

/// Final broker state, split out for the run result.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub cash: f64,
    pub position: Option<Position>,
    pub total_commission: f64,
    pub fills: Vec<Fill>,
    pub trades: Vec<Trade>,
    pub rejections: Vec<Rejection>,
}
