//! Bar loop: the sequential driver of a run.
//!
//! Per bar, in order:
//! 1. Validate the bar (finite positive prices, strictly increasing time).
//! 2. Risk overlay on the window `bars[..=t]`: forced exit, or trail update + signal.
//! 3. Order translator maps the decision onto a transition.
//! 4. Broker executes it at the exit level or the bar's close.
//! 5. Record the equity point marked at the close.
//!
//! Any fatal error rolls the broker back to the end of the previous bar and
//! aborts with the partial result.

use chrono::NaiveDateTime;
use tracing::debug;

use super::broker::{Broker, EntryOrder};
use super::error::{AbortCause, EngineError, RunAborted};
use super::state::{EngineConfig, EquityPoint, RunResult};
use super::translator::{OrderTranslator, Transition};
use crate::components::commission::{CommissionError, CommissionModel};
use crate::components::risk::{RiskDecision, RiskOverlay};
use crate::domain::{Bar, ExitReason, Side};

/// Run one backtest over `bars`.
///
/// Bars are read-only and may be shared by concurrent runs.
pub fn run_backtest(
    bars: &[Bar],
    overlay: &RiskOverlay,
    commission: Box<dyn CommissionModel>,
    config: &EngineConfig,
) -> Result<RunResult, EngineError> {
    config.validate()?;
    debug!(
        bars = bars.len(),
        strategy = overlay.strategy().name(),
        commission = commission.name(),
        "starting bar loop"
    );

    let mut run = BarLoop::new(overlay, commission, config);
    for index in 0..bars.len() {
        let checkpoint = run.broker.checkpoint();
        if let Err(cause) = run.step(bars, index) {
            run.broker.rollback(checkpoint);
            let partial = run.finish(index);
            return Err(Box::new(RunAborted {
                bar_index: index,
                timestamp: bars[index].timestamp,
                cause,
                partial: Box::new(partial),
            })
            .into());
        }
    }
    Ok(run.finish(bars.len()))
}

/// Mutable state of one run.
struct BarLoop<'a> {
    overlay: &'a RiskOverlay,
    translator: OrderTranslator,
    broker: Broker,
    config: &'a EngineConfig,
    equity_curve: Vec<EquityPoint>,
    last_timestamp: Option<NaiveDateTime>,
    bars_in_market: usize,
    signal_count: usize,
}

impl<'a> BarLoop<'a> {
    fn new(
        overlay: &'a RiskOverlay,
        commission: Box<dyn CommissionModel>,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            overlay,
            translator: OrderTranslator::new(config.trading_mode),
            broker: Broker::new(config.initial_cash, commission),
            config,
            equity_curve: Vec::new(),
            last_timestamp: None,
            bars_in_market: 0,
            signal_count: 0,
        }
    }

    fn step(&mut self, bars: &[Bar], index: usize) -> Result<(), AbortCause> {
        let bar = &bars[index];
        bar.validate_after(self.last_timestamp)?;

        let window = &bars[..=index];
        let last_bar = index + 1 == bars.len();
        let mut signalled = false;
        match self.overlay.on_bar(window, self.broker.position())? {
            RiskDecision::Exit(exit) => {
                let transition = self
                    .translator
                    .force_close(self.broker.position_side(), exit.reason);
                self.apply(transition, exit.price, bar, index)?;
            }
            RiskDecision::Continue { trail, signal } => {
                if let Some(update) = trail {
                    self.broker.apply_trail(update);
                }
                signalled = !signal.is_none();
                let mut transition =
                    self.translator.translate(self.broker.position_side(), signal);
                if last_bar && self.config.close_at_end {
                    transition = without_entry(transition);
                }
                self.apply(transition, bar.close, bar, index)?;
            }
        }

        if last_bar && self.config.close_at_end {
            self.broker
                .close(bar.close, index, bar.timestamp, ExitReason::EndOfData)?;
        }

        // Nothing below can fail.
        if signalled {
            self.signal_count += 1;
        }
        if self.broker.position().is_some() {
            self.bars_in_market += 1;
        }
        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: self.broker.equity(bar.close),
        });
        self.last_timestamp = Some(bar.timestamp);
        Ok(())
    }

    fn apply(
        &mut self,
        transition: Transition,
        price: f64,
        bar: &Bar,
        index: usize,
    ) -> Result<(), CommissionError> {
        match transition {
            Transition::Hold => {}
            Transition::Open(side) => {
                self.open(side, price, bar, index)?;
            }
            Transition::Close(reason) => {
                self.broker.close(price, index, bar.timestamp, reason)?;
            }
            Transition::Reverse(side) => {
                self.broker
                    .close(price, index, bar.timestamp, ExitReason::Reversal)?;
                if !self.open(side, price, bar, index)? {
                    // The flip never happened: the signal only closed the position.
                    self.broker.relabel_last_exit(ExitReason::Signal);
                }
            }
        }
        Ok(())
    }

    /// Returns whether a position was opened.
    fn open(
        &mut self,
        side: Side,
        price: f64,
        bar: &Bar,
        index: usize,
    ) -> Result<bool, CommissionError> {
        let quantity = self.overlay.size(self.broker.cash(), price);
        let (stop_price, take_profit) = self.overlay.entry_levels(side, price);
        self.broker.open(
            EntryOrder {
                side,
                quantity,
                price,
                stop_price,
                take_profit,
            },
            index,
            bar.timestamp,
        )
    }

    /// Snapshot the run after `bar_count` processed bars.
    fn finish(self, bar_count: usize) -> RunResult {
        let initial_cash = self.config.initial_cash;
        let final_equity = self
            .equity_curve
            .last()
            .map_or(initial_cash, |p| p.equity);
        let ledger = self.broker.into_ledger();
        RunResult {
            equity_curve: self.equity_curve,
            trades: ledger.trades,
            fills: ledger.fills,
            rejections: ledger.rejections,
            initial_cash,
            final_cash: ledger.cash,
            final_equity,
            open_position: ledger.position,
            bar_count,
            bars_in_market: self.bars_in_market,
            total_commission: ledger.total_commission,
            signal_count: self.signal_count,
        }
    }
}

/// Drop the entry leg of a transition. The last bar of a run that closes at
/// the end never opens a position.
fn without_entry(transition: Transition) -> Transition {
    match transition {
        Transition::Open(_) => Transition::Hold,
        Transition::Reverse(_) => Transition::Close(ExitReason::Signal),
        other => other,
    }
}
