//! Position sizers: translate available cash into a whole-unit quantity.

/// Hard cap on the fraction of cash any single entry may commit.
pub const MAX_CASH_FRACTION: f64 = 0.9999;

/// Position sizing policy.
///
/// Sizers decide quantity only; affordability against the commission is the
/// broker's job.
pub trait Sizer: Send + Sync {
    fn name(&self) -> &str;

    /// Whole units to buy or sell short at `price` with `cash` available.
    /// Returns 0.0 when nothing can be afforded.
    fn size(&self, cash: f64, price: f64) -> f64;
}

/// Commits a fixed fraction of available cash (not equity) per new position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFractionSizer {
    pub fraction: f64,
}

impl FixedFractionSizer {
    pub fn new(fraction: f64) -> Self {
        Self { fraction }
    }

    fn effective_fraction(&self) -> f64 {
        self.fraction.min(MAX_CASH_FRACTION)
    }
}

impl Sizer for FixedFractionSizer {
    fn name(&self) -> &str {
        "fixed_fraction"
    }

    fn size(&self, cash: f64, price: f64) -> f64 {
        if cash <= 0.0 || price <= 0.0 || !cash.is_finite() {
            return 0.0;
        }
        (cash * self.effective_fraction() / price).floor().max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_fraction_of_cash_in_whole_units() {
        let sizer = FixedFractionSizer::new(0.1);
        assert_eq!(sizer.size(10_000.0, 33.0), 30.0);
    }

    #[test]
    fn full_fraction_is_capped() {
        let sizer = FixedFractionSizer::new(1.0);
        // 0.9999 * 10_000 / 100 = 99.99 → 99
        assert_eq!(sizer.size(10_000.0, 100.0), 99.0);
    }

    #[test]
    fn unaffordable_is_zero() {
        let sizer = FixedFractionSizer::new(1.0);
        assert_eq!(sizer.size(50.0, 100.0), 0.0);
        assert_eq!(sizer.size(0.0, 100.0), 0.0);
        assert_eq!(sizer.size(-10.0, 100.0), 0.0);
    }
}
