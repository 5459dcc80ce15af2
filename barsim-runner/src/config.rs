//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! initial_cash = 10000.0
//! trading_mode = "long_short"
//! data = "data/SPY_1hour_1year.csv"
//!
//! [strategy]
//! component_type = "ma_crossover"
//! params = { fast_period = 10, slow_period = 20 }
//!
//! [risk]
//! trail_pct = 0.02
//! take_profit_pct = 0.05
//! risk_fraction = 0.1
//!
//! [commission]
//! model = "ibkr_pro"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use barsim_core::components::{
    CommissionModel, ConfigError, FixedRate, NoCommission, RiskOverlay, RiskParams,
    StrategyRegistry, Tiered,
};
use barsim_core::engine::{EngineConfig, TradingMode};
use barsim_core::fingerprint::{ComponentConfig, StrategyConfig};

/// Errors from reading a config file.
#[derive(Debug, Error)]
pub enum RunnerConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Top-level configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    pub strategy: ComponentConfig,
    #[serde(default)]
    pub risk: RiskParams,
    #[serde(default)]
    pub commission: CommissionConfig,
}

/// The `[backtest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_cash: f64,
    /// Bars per year, used to annualize the Sharpe ratio.
    pub annualization_factor: f64,
    pub close_at_end: bool,
    pub trading_mode: TradingMode,
    /// CSV bar file. The CLI's `--data` flag takes precedence.
    pub data: Option<PathBuf>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            annualization_factor: 252.0,
            close_at_end: false,
            trading_mode: TradingMode::LongShort,
            data: None,
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, RunnerConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, RunnerConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| RunnerConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Checks everything that does not need the strategy registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config().validate()?;
        self.risk.validate()?;
        if !(self.backtest.annualization_factor.is_finite()
            && self.backtest.annualization_factor > 0.0)
        {
            return Err(ConfigError::NonPositive {
                name: "annualization_factor".into(),
                value: self.backtest.annualization_factor,
            });
        }
        self.commission.build()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.initial_cash)
            .with_trading_mode(self.backtest.trading_mode)
            .with_close_at_end(self.backtest.close_at_end)
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            strategy: self.strategy.clone(),
            risk: self.risk,
        }
    }

    /// Resolve the strategy through `registry` and wrap it in a risk overlay.
    pub fn build_overlay(&self, registry: &StrategyRegistry) -> Result<RiskOverlay, ConfigError> {
        let strategy = registry.create(&self.strategy)?;
        RiskOverlay::builder()
            .strategy(strategy)
            .params(self.risk)
            .build()
    }
}

/// The `[commission]` table, tagged by `model`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum CommissionConfig {
    #[default]
    None,
    FixedRate {
        rate: f64,
    },
    Tiered {
        per_share_rate: f64,
        minimum_per_order: f64,
        max_pct_of_value: f64,
    },
    /// `Tiered` with IBKR Pro fixed pricing.
    IbkrPro,
}

impl CommissionConfig {
    pub fn build(&self) -> Result<Box<dyn CommissionModel>, ConfigError> {
        Ok(match *self {
            CommissionConfig::None => Box::new(NoCommission),
            CommissionConfig::FixedRate { rate } => Box::new(FixedRate::new(rate)?),
            CommissionConfig::Tiered {
                per_share_rate,
                minimum_per_order,
                max_pct_of_value,
            } => Box::new(Tiered::new(
                per_share_rate,
                minimum_per_order,
                max_pct_of_value,
            )?),
            CommissionConfig::IbkrPro => Box::new(Tiered::ibkr_pro()),
        })
    }
}

/// Command-line form: `none`, `ibkr_pro`, or `fixed_rate:<rate>`.
impl FromStr for CommissionConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(CommissionConfig::None),
            "ibkr_pro" | "ibkr" => Ok(CommissionConfig::IbkrPro),
            other => {
                let rate = other
                    .strip_prefix("fixed_rate:")
                    .ok_or_else(|| format!("unknown commission model '{other}'"))?;
                let rate: f64 = rate
                    .parse()
                    .map_err(|_| format!("invalid fixed rate '{rate}'"))?;
                Ok(CommissionConfig::FixedRate { rate })
            }
        }
    }
}
