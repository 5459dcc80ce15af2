//! Domain types for barsim

pub mod bar;
pub mod fill;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::{Bar, BarError};
pub use fill::Fill;
pub use position::{Position, PositionSide, Side};
pub use signal::Signal;
pub use trade::{ExitReason, Trade};
