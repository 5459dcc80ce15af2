//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV observation.
///
/// Bars are immutable once ingested. The engine validates each bar as it
/// reaches it, so a malformed series aborts the run at the offending index
/// rather than being repaired silently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Reasons a bar (or a pair of consecutive bars) is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("{field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("volume must be non-negative, got {0}")]
    NegativeVolume(f64),

    #[error("timestamp {current} does not strictly follow {previous}")]
    NonMonotonic {
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check prices are finite and positive and volume is finite and non-negative.
    pub fn validate(&self) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(BarError::NonFinite { field, value });
            }
            if value <= 0.0 {
                return Err(BarError::NonPositive { field, value });
            }
        }
        if !self.volume.is_finite() {
            return Err(BarError::NonFinite {
                field: "volume",
                value: self.volume,
            });
        }
        if self.volume < 0.0 {
            return Err(BarError::NegativeVolume(self.volume));
        }
        Ok(())
    }

    /// Validate this bar and its ordering relative to the previous bar's timestamp.
    pub fn validate_after(&self, previous: Option<NaiveDateTime>) -> Result<(), BarError> {
        self.validate()?;
        match previous {
            Some(previous) if self.timestamp <= previous => Err(BarError::NonMonotonic {
                previous,
                current: self.timestamp,
            }),
            _ => Ok(()),
        }
    }
}
