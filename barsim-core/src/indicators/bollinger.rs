//! Bollinger Bands: SMA middle band ± k population standard deviations.

use super::trailing;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bands over the `period` closes ending at `end` (exclusive).
pub fn bollinger(bars: &[Bar], end: usize, period: usize, k: f64) -> Option<BollingerBands> {
    let window = trailing(bars, end, period)?;
    let n = period as f64;
    let middle = window.iter().map(|b| b.close).sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|b| (b.close - middle).powi(2))
        .sum::<f64>()
        / n;
    let width = variance.sqrt() * k;
    Some(BollingerBands {
        upper: middle + width,
        middle,
        lower: middle - width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn population_std_dev() {
        // closes 2,4,4,4,5,5,7,9: mean 5, population std 2.
        let bars = make_bars(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let bands = bollinger(&bars, 8, 8, 2.0).unwrap();
        assert_approx(bands.middle, 5.0, 1e-12);
        assert_approx(bands.upper, 9.0, 1e-12);
        assert_approx(bands.lower, 1.0, 1e-12);
    }

    #[test]
    fn flat_series_collapses_bands() {
        let bars = make_bars(&[50.0; 5]);
        let bands = bollinger(&bars, 5, 5, 2.0).unwrap();
        assert_eq!(bands.upper, bands.lower);
    }
}
