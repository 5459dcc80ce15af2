//! Backtesting engine: order translation, execution and the bar loop.

pub mod broker;
pub mod error;
pub mod loop_runner;
pub mod state;
pub mod translator;

pub use broker::{adjusted_price, Broker, EntryOrder, Rejection, RejectionKind};
pub use error::{AbortCause, EngineError, RunAborted};
pub use loop_runner::run_backtest;
pub use state::{EngineConfig, EquityPoint, RunResult};
pub use translator::{OrderTranslator, TradingMode, Transition};
