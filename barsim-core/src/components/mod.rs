//! Pluggable components: the pieces a run is assembled from.
//!
//! - Strategy: reads the bar window, emits buy/sell/none
//! - Risk overlay: wraps a strategy with stop, target and sizing policy
//! - Commission model: prices each fill
//!
//! Plus the registry that builds strategies from configuration.

pub mod commission;
pub mod params;
pub mod registry;
pub mod risk;
pub mod strategy;

pub use commission::{
    CommissionError, CommissionModel, FixedRate, FnCommission, NoCommission, Tiered,
};
pub use params::ConfigError;
pub use registry::{StrategyFactory, StrategyRegistry};
pub use risk::{RiskDecision, RiskOverlay, RiskOverlayBuilder, RiskParams};
pub use strategy::{NullStrategy, Strategy, StrategyError};
