use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One executed order leg.
///
/// `fill_price` has the commission folded in:
/// `fill_price = reference_price + commission / signed_quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    /// Positive for buys, negative for sells.
    pub signed_quantity: f64,
    pub reference_price: f64,
    pub fill_price: f64,
    pub commission: f64,
}

impl Fill {
    pub fn is_buy(&self) -> bool {
        self.signed_quantity > 0.0
    }

    /// Cash leaving the account for this fill (negative when cash comes in).
    pub fn cash_outflow(&self) -> f64 {
        self.signed_quantity * self.fill_price
    }
}
