//! Backtest configuration.
//!
//! [`BacktestConfig`] gathers the `[series]`, `[trading]` and `[costs]`
//! sections into typed values and builds the series and cost criterion they
//! describe.

use crate::adapters::bar_series::InMemoryBarSeries;
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::criteria::LinearTransactionCostCriterion;
use crate::domain::error::EngineError;
use crate::domain::num::{Num, NumBackend};
use crate::domain::trade::Side;
use crate::ports::config_port::{ConfigPort, get_parsed};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub series_name: String,
    pub backend: NumBackend,
    /// `None` keeps every bar.
    pub max_bar_count: Option<usize>,
    pub starting_side: Side,
    pub order_amount: f64,
    pub initial_amount: f64,
    pub cost_a: f64,
    pub cost_b: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            series_name: "series".to_string(),
            backend: NumBackend::default(),
            max_bar_count: None,
            starting_side: Side::Buy,
            order_amount: 1.0,
            initial_amount: 1000.0,
            cost_a: 0.0,
            cost_b: 0.0,
        }
    }
}

impl BacktestConfig {
    /// Validates and reads the configuration. Absent optional keys take the
    /// [`Default`] values; `[costs] initial_amount` is required.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        validate_backtest_config(config)?;
        let defaults = BacktestConfig::default();
        let max_bar_count: usize = get_parsed(config, "series", "max_bar_count", 0)?;
        let parsed = BacktestConfig {
            series_name: config
                .get_string("series", "name")
                .unwrap_or(defaults.series_name),
            backend: get_parsed(config, "series", "backend", defaults.backend)?,
            max_bar_count: (max_bar_count > 0).then_some(max_bar_count),
            starting_side: get_parsed(config, "trading", "starting_side", defaults.starting_side)?,
            order_amount: get_parsed(config, "trading", "order_amount", defaults.order_amount)?,
            initial_amount: get_parsed(config, "costs", "initial_amount", defaults.initial_amount)?,
            cost_a: get_parsed(config, "costs", "cost_a", defaults.cost_a)?,
            cost_b: get_parsed(config, "costs", "cost_b", defaults.cost_b)?,
        };
        tracing::debug!(
            series = %parsed.series_name,
            backend = %parsed.backend,
            side = ?parsed.starting_side,
            "backtest configuration read"
        );
        Ok(parsed)
    }

    /// Amount traded by every order, in the configured backend.
    pub fn order_amount(&self) -> Num {
        self.backend.num_of(self.order_amount)
    }

    pub fn cost_criterion(&self) -> LinearTransactionCostCriterion {
        LinearTransactionCostCriterion::new(self.initial_amount, self.cost_a, self.cost_b)
    }

    /// An empty series with the configured name, backend and bound.
    pub fn new_series(&self) -> InMemoryBarSeries {
        match self.max_bar_count {
            Some(max) => {
                InMemoryBarSeries::with_max_bar_count(self.series_name.clone(), self.backend, max)
            }
            None => InMemoryBarSeries::new(self.series_name.clone(), self.backend),
        }
    }
}
