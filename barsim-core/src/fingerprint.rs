//! Run fingerprinting: deterministic identification of strategy configurations.
//!
//! - `ComponentConfig`: a component type name plus its numeric parameters.
//! - `StrategyConfig`: the signal source plus the risk overlay's parameters.
//! - `full_hash()`: BLAKE3 over a canonical text rendering, stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::components::risk::RiskParams;

/// Configuration of a single component (a strategy, in practice).
///
/// Uses `BTreeMap` for deterministic key ordering during hashing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentConfig {
    pub component_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ComponentConfig {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    fn write_canonical(&self, out: &mut String) {
        out.push_str(&self.component_type);
        for (name, value) in &self.params {
            // `{:?}` keeps full f64 precision and distinguishes 1 from 1.0000001.
            let _ = write!(out, ";{name}={value:?}");
        }
    }
}

/// Complete strategy configuration: the signal source and its risk overlay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    pub strategy: ComponentConfig,
    pub risk: RiskParams,
}

impl StrategyConfig {
    /// Structural + parameter hash (hex). Two configs hash equal iff their
    /// component types and all parameter values are equal.
    pub fn full_hash(&self) -> String {
        let mut canonical = String::new();
        self.strategy.write_canonical(&mut canonical);
        let _ = write!(
            canonical,
            "|trail_pct={:?};take_profit_pct={:?};risk_fraction={:?}",
            self.risk.trail_pct, self.risk.take_profit_pct, self.risk.risk_fraction
        );
        blake3::hash(canonical.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fast: f64) -> StrategyConfig {
        StrategyConfig {
            strategy: ComponentConfig::new("ma_crossover")
                .with_param("fast_period", fast)
                .with_param("slow_period", 20.0),
            risk: RiskParams::default(),
        }
    }

    #[test]
    fn full_hash_is_deterministic() {
        assert_eq!(config(10.0).full_hash(), config(10.0).full_hash());
        assert_eq!(config(10.0).full_hash().len(), 64);
    }

    #[test]
    fn full_hash_changes_with_params() {
        assert_ne!(config(10.0).full_hash(), config(11.0).full_hash());
    }

    #[test]
    fn full_hash_changes_with_risk() {
        let a = config(10.0);
        let mut b = a.clone();
        b.risk.trail_pct = 0.03;
        assert_ne!(a.full_hash(), b.full_hash());
    }
}
