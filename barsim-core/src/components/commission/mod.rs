//! Commission models: pure fee functions applied to each fill.
//!
//! The broker only sees `dyn CommissionModel`; it never needs to know which
//! concrete model it is calling. Every model is sign-agnostic: the fee for
//! selling 100 units equals the fee for buying 100 units at the same price.

pub mod fixed_rate;
pub mod tiered;

pub use fixed_rate::FixedRate;
pub use tiered::Tiered;

use thiserror::Error;

/// A commission model that failed or produced an unusable fee.
///
/// Always fatal to the run: a broken fee function must not silently corrupt
/// the ledger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommissionError {
    #[error("{model} returned invalid fee {fee} for quantity {quantity} at price {price}")]
    InvalidFee {
        model: String,
        quantity: f64,
        price: f64,
        fee: f64,
    },

    #[error("{model} failed: {reason}")]
    Failed { model: String, reason: String },
}

/// Maps an order (signed quantity, reference price) to a non-negative fee.
pub trait CommissionModel: Send + Sync {
    fn name(&self) -> &str;

    fn fee(&self, quantity: f64, price: f64) -> Result<f64, CommissionError>;
}

/// Evaluate `model` and reject NaN, infinite or negative fees.
pub fn checked_fee(
    model: &dyn CommissionModel,
    quantity: f64,
    price: f64,
) -> Result<f64, CommissionError> {
    let fee = model.fee(quantity, price)?;
    if fee.is_finite() && fee >= 0.0 {
        Ok(fee)
    } else {
        Err(CommissionError::InvalidFee {
            model: model.name().to_string(),
            quantity,
            price,
            fee,
        })
    }
}

/// Zero-cost model.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommission;

impl CommissionModel for NoCommission {
    fn name(&self) -> &str {
        "none"
    }

    fn fee(&self, _quantity: f64, _price: f64) -> Result<f64, CommissionError> {
        Ok(0.0)
    }
}

/// Adapter turning any `(quantity, price) -> fee` closure into a model.
pub struct FnCommission<F> {
    name: String,
    f: F,
}

impl<F> FnCommission<F>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> CommissionModel for FnCommission<F>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fee(&self, quantity: f64, price: f64) -> Result<f64, CommissionError> {
        Ok((self.f)(quantity.abs(), price))
    }
}

impl<F> std::fmt::Debug for FnCommission<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommission")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
