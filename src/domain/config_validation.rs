//! Configuration validation.
//!
//! Checks every backtest key before [`BacktestConfig`](crate::domain::backtest::BacktestConfig)
//! is built, so a bad file fails with the offending section and key.

use crate::domain::error::EngineError;
use crate::domain::num::NumBackend;
use crate::domain::trade::Side;
use crate::ports::config_port::{ConfigPort, get_parsed};

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    validate_series(config)?;
    validate_trading(config)?;
    validate_costs(config)?;
    Ok(())
}

fn validate_series(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if let Some(name) = config.get_string("series", "name") {
        if name.trim().is_empty() {
            return Err(EngineError::invalid("series", "name", "name must not be empty"));
        }
    }
    get_parsed(config, "series", "backend", NumBackend::default())?;
    let max_bar_count: i64 = get_parsed(config, "series", "max_bar_count", 0)?;
    if max_bar_count < 0 {
        return Err(EngineError::invalid(
            "series",
            "max_bar_count",
            "max_bar_count must be non-negative",
        ));
    }
    Ok(())
}

fn validate_trading(config: &dyn ConfigPort) -> Result<(), EngineError> {
    get_parsed(config, "trading", "starting_side", Side::Buy)?;
    let amount: f64 = get_parsed(config, "trading", "order_amount", 1.0)?;
    if amount.is_nan() || amount <= 0.0 {
        return Err(EngineError::invalid(
            "trading",
            "order_amount",
            "order_amount must be positive",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if config.get_string("costs", "initial_amount").is_none() {
        return Err(EngineError::ConfigMissing {
            section: "costs".to_string(),
            key: "initial_amount".to_string(),
        });
    }
    let initial: f64 = get_parsed(config, "costs", "initial_amount", 0.0)?;
    if initial.is_nan() || initial <= 0.0 {
        return Err(EngineError::invalid(
            "costs",
            "initial_amount",
            "initial_amount must be positive",
        ));
    }
    for key in ["cost_a", "cost_b"] {
        let value: f64 = get_parsed(config, "costs", key, 0.0)?;
        if value.is_nan() || value < 0.0 {
            return Err(EngineError::invalid(
                "costs",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(content: &str) -> String {
        match validate_backtest_config(&make_config(content)) {
            Err(EngineError::ConfigInvalid { key, .. }) => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[series]
name = AAPL daily
backend = double
max_bar_count = 500

[trading]
starting_side = sell
order_amount = 10

[costs]
initial_amount = 1000
cost_a = 0.005
cost_b = 0.5
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn minimal_config_passes() {
        let config = make_config("[costs]\ninitial_amount = 1\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn missing_initial_amount_fails() {
        let err = validate_backtest_config(&make_config("[costs]\ncost_a = 0.1\n")).unwrap_err();
        assert!(
            matches!(err, EngineError::ConfigMissing { key, .. } if key == "initial_amount")
        );
    }

    #[test]
    fn initial_amount_zero_fails() {
        assert_eq!(invalid_key("[costs]\ninitial_amount = 0\n"), "initial_amount");
    }

    #[test]
    fn negative_costs_fail() {
        assert_eq!(
            invalid_key("[costs]\ninitial_amount = 10\ncost_a = -0.1\n"),
            "cost_a"
        );
        assert_eq!(
            invalid_key("[costs]\ninitial_amount = 10\ncost_b = -1\n"),
            "cost_b"
        );
    }

    #[test]
    fn non_numeric_cost_fails() {
        assert_eq!(
            invalid_key("[costs]\ninitial_amount = 10\ncost_a = cheap\n"),
            "cost_a"
        );
    }

    #[test]
    fn unknown_backend_fails() {
        assert_eq!(
            invalid_key("[series]\nbackend = bigfloat\n[costs]\ninitial_amount = 1\n"),
            "backend"
        );
    }

    #[test]
    fn unknown_side_fails() {
        assert_eq!(
            invalid_key("[trading]\nstarting_side = hold\n[costs]\ninitial_amount = 1\n"),
            "starting_side"
        );
    }

    #[test]
    fn order_amount_must_be_positive() {
        assert_eq!(
            invalid_key("[trading]\norder_amount = 0\n[costs]\ninitial_amount = 1\n"),
            "order_amount"
        );
    }

    #[test]
    fn negative_max_bar_count_fails() {
        assert_eq!(
            invalid_key("[series]\nmax_bar_count = -5\n[costs]\ninitial_amount = 1\n"),
            "max_bar_count"
        );
    }
}
