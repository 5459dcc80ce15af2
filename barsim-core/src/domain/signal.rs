use serde::{Deserialize, Serialize};

/// Per-bar output of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// No action this bar (also the warm-up answer).
    #[default]
    None,
    Buy,
    Sell,
}

impl Signal {
    pub fn is_none(&self) -> bool {
        matches!(self, Signal::None)
    }
}
