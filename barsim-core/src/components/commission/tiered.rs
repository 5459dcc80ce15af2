//! Tiered per-share commission with a per-order floor and a value cap.
//!
//! ```text
//! base   = |q| * per_share_rate
//! capped = min(base, max_pct_of_value * |q| * price)
//! fee    = max(capped, minimum_per_order)
//! ```
//!
//! The floor is applied after the cap, so on tiny orders the minimum can
//! exceed the percentage cap.

use super::{CommissionError, CommissionModel};
use crate::components::params::{require_range, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tiered {
    pub per_share_rate: f64,
    pub minimum_per_order: f64,
    pub max_pct_of_value: f64,
}

impl Tiered {
    pub fn new(
        per_share_rate: f64,
        minimum_per_order: f64,
        max_pct_of_value: f64,
    ) -> Result<Self, ConfigError> {
        require_range("per_share_rate", per_share_rate, 0.0, f64::MAX)?;
        require_range("minimum_per_order", minimum_per_order, 0.0, f64::MAX)?;
        require_range("max_pct_of_value", max_pct_of_value, 0.0, 1.0)?;
        Ok(Self {
            per_share_rate,
            minimum_per_order,
            max_pct_of_value,
        })
    }

    /// IBKR Pro fixed pricing: $0.0035/share, $0.35 minimum, 1% of value cap.
    pub fn ibkr_pro() -> Self {
        Self {
            per_share_rate: 0.0035,
            minimum_per_order: 0.35,
            max_pct_of_value: 0.01,
        }
    }
}

impl CommissionModel for Tiered {
    fn name(&self) -> &str {
        "tiered"
    }

    fn fee(&self, quantity: f64, price: f64) -> Result<f64, CommissionError> {
        let quantity = quantity.abs();
        let trade_value = quantity * price;
        let base = quantity * self.per_share_rate;
        let capped = base.min(self.max_pct_of_value * trade_value);
        Ok(capped.max(self.minimum_per_order))
    }
}
