//! Strategy registry: explicit id → factory mapping.
//!
//! Populated by `register` calls at startup; `with_builtins()` registers the
//! reference strategies. Lookups never scan or reflect.

use std::collections::BTreeMap;

use super::params::ConfigError;
use super::strategy::{BollingerReversion, MaCrossover, NullStrategy, RsiThreshold, Strategy};
use crate::fingerprint::ComponentConfig;

/// Builds a strategy from its configuration.
pub type StrategyFactory = fn(&ComponentConfig) -> Result<Box<dyn Strategy>, ConfigError>;

#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `ma_crossover`, `rsi_threshold`, `bollinger` and `null`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, StrategyFactory); 4] = [
            ("ma_crossover", |c| Ok(Box::new(MaCrossover::from_config(c)?))),
            ("rsi_threshold", |c| {
                Ok(Box::new(RsiThreshold::from_config(c)?))
            }),
            ("bollinger", |c| {
                Ok(Box::new(BollingerReversion::from_config(c)?))
            }),
            ("null", |_| Ok(Box::new(NullStrategy))),
        ];
        for (id, factory) in builtins {
            registry.factories.insert(id.to_string(), factory);
        }
        registry
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: StrategyFactory,
    ) -> Result<(), ConfigError> {
        let id = id.into();
        if self.factories.contains_key(&id) {
            return Err(ConfigError::DuplicateStrategy(id));
        }
        self.factories.insert(id, factory);
        Ok(())
    }

    /// Instantiate the strategy named by `config.component_type`.
    pub fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Strategy>, ConfigError> {
        let factory = self
            .factories
            .get(&config.component_type)
            .ok_or_else(|| ConfigError::UnknownStrategy(config.component_type.clone()))?;
        factory(config)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = StrategyRegistry::with_builtins();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, ["bollinger", "ma_crossover", "null", "rsi_threshold"]);
    }

    #[test]
    fn create_passes_params_through() {
        let registry = StrategyRegistry::with_builtins();
        let config = ComponentConfig::new("ma_crossover")
            .with_param("fast_period", 3.0)
            .with_param("slow_period", 7.0);
        let strategy = registry.create(&config).unwrap();
        assert_eq!(strategy.name(), "ma_crossover");
        assert_eq!(strategy.params()["slow_period"], 7.0);
    }

    #[test]
    fn unknown_id_is_config_error() {
        let registry = StrategyRegistry::with_builtins();
        let err = registry
            .create(&ComponentConfig::new("martingale"))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::UnknownStrategy("martingale".into()));
    }

    #[test]
    fn invalid_params_surface_from_factory() {
        let registry = StrategyRegistry::with_builtins();
        let config = ComponentConfig::new("ma_crossover").with_param("fast_period", -1.0);
        assert!(matches!(
            registry.create(&config),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = StrategyRegistry::new();
        registry.register("flat", |_| Ok(Box::new(NullStrategy))).unwrap();
        assert_eq!(
            registry.register("flat", |_| Ok(Box::new(NullStrategy))),
            Err(ConfigError::DuplicateStrategy("flat".into()))
        );
        assert!(registry.contains("flat"));
    }
}
