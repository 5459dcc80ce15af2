//! Risk overlay: wraps a strategy with trailing-stop, take-profit and sizing.
//!
//! Each bar the overlay runs three steps in a fixed order:
//! 1. If a position is open, test the bar against its stop and target. A
//!    breach forces a close and the strategy is not consulted.
//! 2. Otherwise extend the watermark to the bar's close and ratchet the stop.
//! 3. Ask the wrapped strategy for its signal.
//!
//! The overlay never mutates the position; it returns a `RiskDecision` the
//! engine applies through the broker.

pub mod sizing;
pub mod trailing;

pub use sizing::{FixedFractionSizer, Sizer, MAX_CASH_FRACTION};
pub use trailing::{ForcedExit, TrailUpdate};

use serde::{Deserialize, Serialize};

use super::params::{require_range, ConfigError};
use super::strategy::{Strategy, StrategyError};
use crate::domain::{Bar, Position, Side, Signal};

/// Exit and sizing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParams {
    /// Trailing distance as a fraction of the watermark. 0 disables.
    pub trail_pct: f64,
    /// Take-profit distance as a fraction of entry. 0 disables.
    pub take_profit_pct: f64,
    /// Fraction of available cash committed per entry.
    pub risk_fraction: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            trail_pct: 0.02,
            take_profit_pct: 0.05,
            risk_fraction: 0.1,
        }
    }
}

impl RiskParams {
    /// Exits disabled, sizing unchanged.
    pub fn signal_only(risk_fraction: f64) -> Self {
        Self {
            trail_pct: 0.0,
            take_profit_pct: 0.0,
            risk_fraction,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // A 100% trail would put a long's stop at zero.
        require_range("trail_pct", self.trail_pct, 0.0, 0.99)?;
        require_range("take_profit_pct", self.take_profit_pct, 0.0, f64::MAX)?;
        if self.risk_fraction <= 0.0 || self.risk_fraction.is_nan() {
            return Err(ConfigError::NonPositive {
                name: "risk_fraction".into(),
                value: self.risk_fraction,
            });
        }
        require_range("risk_fraction", self.risk_fraction, 0.0, 1.0)?;
        Ok(())
    }
}

/// What the engine should do with the current bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskDecision {
    /// Close the open position; no re-entry this bar.
    Exit(ForcedExit),
    /// Apply the trail update (if a position is open) and route the signal.
    Continue {
        trail: Option<TrailUpdate>,
        signal: Signal,
    },
}

/// A strategy wrapped with exit rules and a sizing policy.
pub struct RiskOverlay {
    strategy: Box<dyn Strategy>,
    sizer: Box<dyn Sizer>,
    params: RiskParams,
}

impl std::fmt::Debug for RiskOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskOverlay")
            .field("strategy", &self.strategy.name())
            .field("sizer", &self.sizer.name())
            .field("params", &self.params)
            .finish()
    }
}

impl RiskOverlay {
    pub fn builder() -> RiskOverlayBuilder {
        RiskOverlayBuilder::default()
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn params(&self) -> &RiskParams {
        &self.params
    }

    pub fn warmup_bars(&self) -> usize {
        self.strategy.warmup_bars()
    }

    /// Quantity for a new entry at `price` given `cash`.
    pub fn size(&self, cash: f64, price: f64) -> f64 {
        self.sizer.size(cash, price)
    }

    /// Initial (stop, take-profit) for a position opened at `price`.
    ///
    /// The stop is seeded from the entry price; the entry bar itself is never
    /// checked against it.
    pub fn entry_levels(&self, side: Side, price: f64) -> (Option<f64>, Option<f64>) {
        (
            trailing::trailing_stop(side, price, self.params.trail_pct),
            trailing::take_profit_level(side, price, self.params.take_profit_pct),
        )
    }

    /// Evaluate the current bar. `window` is `bars[..=t]`; `position` is the
    /// state carried in from bar `t - 1`.
    pub fn on_bar(
        &self,
        window: &[Bar],
        position: Option<&Position>,
    ) -> Result<RiskDecision, StrategyError> {
        let Some(bar) = window.last() else {
            return Ok(RiskDecision::Continue {
                trail: None,
                signal: Signal::None,
            });
        };

        let trail = match position {
            Some(pos) => {
                if let Some(exit) = trailing::check_exits(pos, bar) {
                    return Ok(RiskDecision::Exit(exit));
                }
                let watermark = trailing::advance_watermark(pos.side, pos.watermark, bar.close);
                let proposed = trailing::trailing_stop(pos.side, watermark, self.params.trail_pct);
                Some(TrailUpdate {
                    watermark,
                    stop_price: trailing::ratchet(pos.side, pos.stop_price, proposed),
                })
            }
            None => None,
        };

        let signal = self.strategy.evaluate(window)?;
        Ok(RiskDecision::Continue { trail, signal })
    }
}

/// Builder for `RiskOverlay`. A strategy is mandatory.
#[derive(Default)]
pub struct RiskOverlayBuilder {
    strategy: Option<Box<dyn Strategy>>,
    sizer: Option<Box<dyn Sizer>>,
    params: RiskParams,
}

impl RiskOverlayBuilder {
    pub fn strategy(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Replace the default fixed-fraction sizer.
    pub fn sizer(mut self, sizer: Box<dyn Sizer>) -> Self {
        self.sizer = Some(sizer);
        self
    }

    pub fn params(mut self, params: RiskParams) -> Self {
        self.params = params;
        self
    }

    pub fn trail_pct(mut self, trail_pct: f64) -> Self {
        self.params.trail_pct = trail_pct;
        self
    }

    pub fn take_profit_pct(mut self, take_profit_pct: f64) -> Self {
        self.params.take_profit_pct = take_profit_pct;
        self
    }

    pub fn risk_fraction(mut self, risk_fraction: f64) -> Self {
        self.params.risk_fraction = risk_fraction;
        self
    }

    pub fn build(self) -> Result<RiskOverlay, ConfigError> {
        let strategy = self.strategy.ok_or(ConfigError::MissingStrategy)?;
        self.params.validate()?;
        let sizer = self
            .sizer
            .unwrap_or_else(|| Box::new(FixedFractionSizer::new(self.params.risk_fraction)));
        Ok(RiskOverlay {
            strategy,
            sizer,
            params: self.params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::strategy::NullStrategy;
    use crate::domain::ExitReason;
    use crate::indicators::make_bars;

    /// Emits a fixed signal on every bar.
    struct Always(Signal);

    impl Strategy for Always {
        fn name(&self) -> &str {
            "always"
        }
        fn warmup_bars(&self) -> usize {
            0
        }
        fn evaluate(&self, _window: &[Bar]) -> Result<Signal, StrategyError> {
            Ok(self.0)
        }
    }

    fn overlay(signal: Signal, trail: f64, tp: f64) -> RiskOverlay {
        RiskOverlay::builder()
            .strategy(Box::new(Always(signal)))
            .trail_pct(trail)
            .take_profit_pct(tp)
            .build()
            .unwrap()
    }

    fn long_position(bars: &[Bar], entry: f64, stop: Option<f64>) -> Position {
        let mut pos = Position::new(Side::Long, 10.0, entry, 0.0, bars[0].timestamp, 0);
        pos.stop_price = stop;
        pos
    }

    #[test]
    fn build_without_strategy_is_config_error() {
        let err = RiskOverlay::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingStrategy);
    }

    #[test]
    fn build_rejects_invalid_params() {
        let result = RiskOverlay::builder()
            .strategy(Box::new(NullStrategy))
            .risk_fraction(0.0)
            .build();
        assert!(matches!(result, Err(ConfigError::NonPositive { .. })));

        let result = RiskOverlay::builder()
            .strategy(Box::new(NullStrategy))
            .trail_pct(-0.1)
            .build();
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn flat_passes_strategy_signal_through() {
        let bars = make_bars(&[100.0, 101.0]);
        let decision = overlay(Signal::Buy, 0.02, 0.05).on_bar(&bars, None).unwrap();
        assert_eq!(
            decision,
            RiskDecision::Continue {
                trail: None,
                signal: Signal::Buy
            }
        );
    }

    #[test]
    fn stop_breach_overrides_strategy() {
        // Bar 1: open 100, low 89 → breaches a 95 stop.
        let bars = make_bars(&[100.0, 90.0]);
        let pos = long_position(&bars, 100.0, Some(95.0));
        let decision = overlay(Signal::Buy, 0.05, 0.0)
            .on_bar(&bars, Some(&pos))
            .unwrap();
        match decision {
            RiskDecision::Exit(exit) => {
                assert_eq!(exit.reason, ExitReason::TrailingStop);
                assert_eq!(exit.price, 95.0);
            }
            other => panic!("expected exit, got {other:?}"),
        }
    }

    #[test]
    fn watermark_and_stop_advance_without_breach() {
        // Bar 1: open 100, close 110, low 99: above the 90 stop.
        let bars = make_bars(&[100.0, 110.0]);
        let pos = long_position(&bars, 100.0, Some(90.0));
        let decision = overlay(Signal::None, 0.10, 0.0)
            .on_bar(&bars, Some(&pos))
            .unwrap();
        let RiskDecision::Continue { trail, signal } = decision else {
            panic!("unexpected exit");
        };
        let trail = trail.unwrap();
        assert_eq!(trail.watermark, 110.0);
        assert!((trail.stop_price.unwrap() - 99.0).abs() < 1e-9);
        assert_eq!(signal, Signal::None);
    }

    #[test]
    fn disabled_trail_keeps_no_stop() {
        let bars = make_bars(&[100.0, 110.0]);
        let pos = long_position(&bars, 100.0, None);
        let decision = overlay(Signal::None, 0.0, 0.0)
            .on_bar(&bars, Some(&pos))
            .unwrap();
        let RiskDecision::Continue { trail, .. } = decision else {
            panic!("unexpected exit");
        };
        assert_eq!(trail.unwrap().stop_price, None);
    }

    #[test]
    fn entry_levels_follow_params() {
        let o = overlay(Signal::None, 0.10, 0.05);
        let (stop, tp) = o.entry_levels(Side::Long, 100.0);
        assert!((stop.unwrap() - 90.0).abs() < 1e-9);
        assert!((tp.unwrap() - 105.0).abs() < 1e-9);

        let (stop, tp) = o.entry_levels(Side::Short, 100.0);
        assert!((stop.unwrap() - 110.0).abs() < 1e-9);
        assert!((tp.unwrap() - 95.0).abs() < 1e-9);
    }

    #[test]
    fn default_sizer_uses_risk_fraction() {
        let o = RiskOverlay::builder()
            .strategy(Box::new(NullStrategy))
            .risk_fraction(0.5)
            .build()
            .unwrap();
        assert_eq!(o.size(1_000.0, 10.0), 50.0);
    }
}
