//! Run-level errors.

use chrono::NaiveDateTime;
use thiserror::Error;

use super::state::RunResult;
use crate::components::commission::CommissionError;
use crate::components::params::ConfigError;
use crate::components::strategy::StrategyError;
use crate::domain::BarError;

/// Why a run stopped before its last bar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbortCause {
    #[error("invalid bar: {0}")]
    Bar(#[from] BarError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Commission(#[from] CommissionError),
}

/// A fatal error at a specific bar.
///
/// `partial` holds the state as of the end of the last successfully processed
/// bar; nothing from the failing bar is included.
#[derive(Debug, Clone, Error)]
#[error("run aborted at bar {bar_index} ({timestamp}): {cause}")]
pub struct RunAborted {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    #[source]
    pub cause: AbortCause,
    pub partial: Box<RunResult>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected before any bar was simulated.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Aborted(#[from] Box<RunAborted>),
}
