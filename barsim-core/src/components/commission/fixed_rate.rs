//! Constant-rate commission: a fixed fraction of traded value.

use super::{CommissionError, CommissionModel};
use crate::components::params::{require_range, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRate {
    /// Fraction of trade value (0.001 = 10 bps).
    pub rate: f64,
}

impl FixedRate {
    pub fn new(rate: f64) -> Result<Self, ConfigError> {
        require_range("rate", rate, 0.0, 1.0)?;
        Ok(Self { rate })
    }
}

impl CommissionModel for FixedRate {
    fn name(&self) -> &str {
        "fixed_rate"
    }

    fn fee(&self, quantity: f64, price: f64) -> Result<f64, CommissionError> {
        Ok(self.rate * quantity.abs() * price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_rate_times_value() {
        let model = FixedRate::new(0.001).unwrap();
        assert!((model.fee(100.0, 50.0).unwrap() - 5.0).abs() < 1e-12);
        assert!((model.fee(-100.0, 50.0).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_rate_outside_unit_interval() {
        assert!(FixedRate::new(-0.01).is_err());
        assert!(FixedRate::new(1.5).is_err());
        assert!(FixedRate::new(0.0).is_ok());
    }
}
