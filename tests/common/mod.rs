#![allow(dead_code)]

use std::rc::Rc;

use barledger::adapters::bar_series::InMemoryBarSeries;
use barledger::domain::bar::Bar;
use barledger::domain::error::EngineError;
use barledger::domain::num::NumBackend;
use barledger::domain::rule::{FixedIndexRule, close_above, close_below};
use barledger::domain::strategy::Strategy;
use barledger::ports::data_port::BarSource;
use barledger::ports::series_port::SeriesRef;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Bar source serving prepared closes, or a fixed error.
pub struct MockBarSource {
    pub closes: Vec<f64>,
    pub error: Option<String>,
}

impl MockBarSource {
    pub fn new(closes: &[f64]) -> Self {
        Self {
            closes: closes.to_vec(),
            error: None,
        }
    }

    pub fn with_error(reason: &str) -> Self {
        Self {
            closes: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl BarSource for MockBarSource {
    fn fetch_bars(&self, backend: NumBackend) -> Result<Vec<Bar>, EngineError> {
        if let Some(reason) = &self.error {
            return Err(EngineError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .closes
            .iter()
            .enumerate()
            .map(|(i, &close)| make_bar(backend, i, close))
            .collect())
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Daily bar `day` days after [`start_time`], with a one-point range around
/// `close`.
pub fn make_bar(backend: NumBackend, day: usize, close: f64) -> Bar {
    Bar::from_f64(
        backend,
        start_time() + Duration::days(day as i64),
        [close - 0.5, close + 1.0, close - 1.0, close, 1000.0],
    )
}

pub fn make_series(backend: NumBackend, closes: &[f64]) -> SeriesRef {
    let series = InMemoryBarSeries::new("test", backend);
    for (i, &close) in closes.iter().enumerate() {
        series.add_bar(make_bar(backend, i, close)).unwrap();
    }
    Rc::new(series)
}

/// `count` bars rising by one from `start_price`.
pub fn generate_closes(count: usize, start_price: f64) -> Vec<f64> {
    (0..count).map(|i| start_price + i as f64).collect()
}

/// Enters above `level`, exits below it.
pub fn make_threshold_strategy(series: &SeriesRef, level: f64) -> Strategy {
    Strategy::new(
        format!("threshold {level}"),
        close_above(series, level),
        close_below(series, level),
    )
}

/// Closes one trade per `(entry, exit)` pair.
pub fn make_fixed_strategy(name: &str, trades: &[(usize, usize)]) -> Strategy {
    Strategy::new(
        name,
        FixedIndexRule::new(trades.iter().map(|t| t.0)),
        FixedIndexRule::new(trades.iter().map(|t| t.1)),
    )
}
