//! Parameter extraction and validation shared by every component constructor.

use thiserror::Error;

use crate::fingerprint::ComponentConfig;

/// Pre-run configuration errors. Always fatal: nothing is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("risk overlay has no underlying strategy")]
    MissingStrategy,

    #[error("parameter '{name}' must be positive, got {value}")]
    NonPositive { name: String, value: f64 },

    #[error("parameter '{name}' must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter '{name}' must be a whole number, got {value}")]
    NotWhole { name: String, value: f64 },

    #[error("fast_period ({fast}) must be below slow_period ({slow})")]
    PeriodOrder { fast: usize, slow: usize },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("strategy '{0}' is already registered")]
    DuplicateStrategy(String),
}

/// Largest accepted lookback period.
pub const MAX_PERIOD: usize = u32::MAX as usize;

/// Extract a named f64 parameter, falling back to `default`.
pub fn param(config: &ComponentConfig, name: &str, default: f64) -> f64 {
    config.params.get(name).copied().unwrap_or(default)
}

/// Extract a lookback period: a positive whole number no larger than [`MAX_PERIOD`].
pub fn period_param(
    config: &ComponentConfig,
    name: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let value = param(config, name, default as f64);
    require_positive(name, value)?;
    if value.fract() != 0.0 {
        return Err(ConfigError::NotWhole {
            name: name.to_string(),
            value,
        });
    }
    require_range(name, value, 1.0, MAX_PERIOD as f64)?;
    Ok(value as usize)
}

/// Reject NaN, zero and negative values.
pub fn require_positive(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive {
            name: name.to_string(),
            value,
        })
    }
}

/// Require `min <= value <= max` (NaN always fails).
pub fn require_range(name: &str, value: f64, min: f64, max: f64) -> Result<f64, ConfigError> {
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        })
    }
}
