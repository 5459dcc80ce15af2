//! barsim core: domain types, commission models, strategies, risk overlay,
//! order translation, broker and the bar loop.
//!
//! A run is assembled from three pieces:
//! - a `RiskOverlay` wrapping a `Strategy` (exits + sizing)
//! - a `CommissionModel` handed to the broker
//! - an `EngineConfig` (initial cash, trading mode, end-of-data policy)
//!
//! `engine::run_backtest` drives them over a preloaded `&[Bar]` and returns
//! the trade ledger and equity curve.

pub mod components;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
