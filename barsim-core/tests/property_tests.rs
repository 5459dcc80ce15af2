//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Trailing-stop monotonicity: long stops never fall, short stops never rise
//! 2. Commission models are non-negative and sign-agnostic
//! 3. Ledger consistency: fills reconcile cash, trades never overlap
//! 4. Zero-fee round trip at one price leaves cash unchanged

use barsim_core::components::commission::{FixedRate, NoCommission, Tiered};
use barsim_core::components::risk::{RiskDecision, RiskOverlay, RiskParams};
use barsim_core::components::strategy::{MaCrossover, NullStrategy};
use barsim_core::components::CommissionModel;
use barsim_core::domain::{Bar, ExitReason, Position, Side};
use barsim_core::engine::{run_backtest, Broker, EngineConfig, EntryOrder, TradingMode};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

// ── Generators ───────────────────────────────────────────────────────

fn bars_from_returns(returns: &[f64]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap();
    let mut close = 100.0;
    returns
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let open = close;
            close *= 1.0 + r;
            let high = open.max(close) * 1.002;
            let low = open.min(close) * 0.998;
            Bar::new(start + Duration::days(i as i64), open, high, low, close, 1_000.0)
        })
        .collect()
}

fn arb_returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.04..0.04_f64, 30..150)
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Long), Just(Side::Short)]
}

// ── 1. Trailing-stop monotonicity ────────────────────────────────────

proptest! {
    /// Over the life of a position the stop only tightens.
    #[test]
    fn stop_never_loosens(
        returns in arb_returns(),
        side in arb_side(),
        trail_pct in 0.005..0.2_f64,
    ) {
        let bars = bars_from_returns(&returns);
        let overlay = RiskOverlay::builder()
            .strategy(Box::new(NullStrategy))
            .params(RiskParams { trail_pct, take_profit_pct: 0.0, risk_fraction: 0.1 })
            .build()
            .unwrap();

        let entry = bars[0].close;
        let mut position = Position::new(side, 10.0, entry, 0.0, bars[0].timestamp, 0);
        position.stop_price = overlay.entry_levels(side, entry).0;

        for t in 1..bars.len() {
            let previous = position.stop_price.unwrap();
            match overlay.on_bar(&bars[..=t], Some(&position)).unwrap() {
                RiskDecision::Exit(exit) => {
                    prop_assert_eq!(exit.reason, ExitReason::TrailingStop);
                    break;
                }
                RiskDecision::Continue { trail, .. } => {
                    let update = trail.unwrap();
                    position.watermark = update.watermark;
                    position.stop_price = update.stop_price;
                    let current = position.stop_price.unwrap();
                    match side {
                        Side::Long => prop_assert!(current >= previous),
                        Side::Short => prop_assert!(current <= previous),
                    }
                }
            }
        }
    }
}

// ── 2. Commission contract ───────────────────────────────────────────

proptest! {
    #[test]
    fn tiered_fee_bounds(
        quantity in -100_000.0..100_000.0_f64,
        price in 0.01..1_000.0_f64,
        rate in 0.0..0.01_f64,
        minimum in 0.0..5.0_f64,
        max_pct in 0.0..0.05_f64,
    ) {
        let model = Tiered::new(rate, minimum, max_pct).unwrap();
        let fee = model.fee(quantity, price).unwrap();
        prop_assert!(fee.is_finite());
        prop_assert!(fee >= minimum);
        prop_assert_eq!(fee, model.fee(-quantity, price).unwrap());
        // Above the floor the fee never exceeds the per-share base.
        prop_assert!(fee <= (quantity.abs() * rate).max(minimum) + 1e-9);
    }

    #[test]
    fn fixed_rate_fee_is_proportional(
        quantity in -10_000.0..10_000.0_f64,
        price in 0.01..1_000.0_f64,
        rate in 0.0..0.01_f64,
    ) {
        let model = FixedRate::new(rate).unwrap();
        let fee = model.fee(quantity, price).unwrap();
        prop_assert!(fee >= 0.0);
        prop_assert!((fee - rate * quantity.abs() * price).abs() < 1e-9);
    }
}

// ── 3. Ledger consistency ────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Fills reconcile to cash, trades are ordered and never overlap, and the
    /// equity curve has one point per bar.
    #[test]
    fn ledger_reconciles(
        returns in arb_returns(),
        fast in 2usize..6,
        gap in 1usize..10,
        trail_pct in prop_oneof![Just(0.0), 0.01..0.1_f64],
        long_only in any::<bool>(),
        fraction in 0.05..1.0_f64,
    ) {
        let bars = bars_from_returns(&returns);
        let overlay = RiskOverlay::builder()
            .strategy(Box::new(MaCrossover::new(fast, fast + gap).unwrap()))
            .params(RiskParams { trail_pct, take_profit_pct: 0.0, risk_fraction: fraction })
            .build()
            .unwrap();
        let mode = if long_only { TradingMode::LongOnly } else { TradingMode::LongShort };
        let config = EngineConfig::new(10_000.0).with_trading_mode(mode);
        let result = run_backtest(&bars, &overlay, Box::new(Tiered::ibkr_pro()), &config).unwrap();

        prop_assert_eq!(result.equity_curve.len(), bars.len());

        let cash_from_fills = result
            .fills
            .iter()
            .fold(10_000.0, |cash, f| cash - f.cash_outflow());
        prop_assert!((cash_from_fills - result.final_cash).abs() < 1e-6);

        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].exit_time <= pair[1].exit_time);
            prop_assert!(pair[0].exit_bar <= pair[1].entry_bar);
        }
        if long_only {
            prop_assert!(result.trades.iter().all(|t| t.side == Side::Long));
        }

        let last_close = bars.last().unwrap().close;
        let marked = result
            .open_position
            .as_ref()
            .map_or(0.0, |p| p.market_value(last_close));
        prop_assert!((result.final_equity - (result.final_cash + marked)).abs() < 1e-6);
    }
}

// ── 4. Zero-fee round trip ───────────────────────────────────────────

proptest! {
    #[test]
    fn zero_fee_round_trip_is_flat(
        quantity in 1.0..500.0_f64,
        price in 1.0..100.0_f64,
        side in arb_side(),
    ) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(16, 0, 0).unwrap();
        let mut broker = Broker::new(100_000.0, Box::new(NoCommission));
        let order = EntryOrder {
            side,
            quantity: quantity.floor(),
            price,
            stop_price: None,
            take_profit: None,
        };
        prop_assert!(broker.open(order, 0, start).unwrap());
        let trade = broker
            .close(price, 1, start + Duration::days(1), ExitReason::Signal)
            .unwrap()
            .cloned()
            .unwrap();
        prop_assert!(trade.pnl.abs() < 1e-9);
        prop_assert!((broker.cash() - 100_000.0).abs() < 1e-6);
    }
}
