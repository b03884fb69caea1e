//! Strategy execution over a bar series.
//!
//! [`SeriesManager::run`] walks the retained bars in order, asks the strategy
//! whether to operate, and records orders at each bar's close price.

use crate::domain::error::EngineError;
use crate::domain::num::Num;
use crate::domain::strategy::Strategy;
use crate::domain::trade::{OrderKind, Side, TradeState};
use crate::domain::trading_record::TradingRecord;
use crate::ports::series_port::{BarSeries, SeriesRef};

#[derive(Clone)]
pub struct SeriesManager {
    series: SeriesRef,
}

impl SeriesManager {
    pub fn new(series: SeriesRef) -> Self {
        SeriesManager { series }
    }

    pub fn series(&self) -> &SeriesRef {
        &self.series
    }

    /// Long trades of one unit over the whole retained window.
    pub fn run(&self, strategy: &Strategy) -> Result<TradingRecord, EngineError> {
        self.run_with(strategy, Side::Buy, self.series.num_of(1.0))
    }

    pub fn run_with(
        &self,
        strategy: &Strategy,
        side: Side,
        amount: Num,
    ) -> Result<TradingRecord, EngineError> {
        match self.series.end_index() {
            Some(end) => self.run_between(strategy, side, amount, self.series.begin_index(), end),
            None => Ok(TradingRecord::new(side)),
        }
    }

    /// Runs over `start..=end`, clamped to the retained window. An empty
    /// window yields an empty record.
    pub fn run_between(
        &self,
        strategy: &Strategy,
        side: Side,
        amount: Num,
        start: usize,
        end: usize,
    ) -> Result<TradingRecord, EngineError> {
        let mut record = TradingRecord::new(side);
        let Some(last) = self.series.end_index() else {
            return Ok(record);
        };
        let start = start.max(self.series.begin_index());
        let end = end.min(last);
        tracing::debug!(
            strategy = strategy.name(),
            series = self.series.name(),
            start,
            end,
            "running strategy"
        );

        for index in start..=end {
            if !strategy.should_operate(index, &record)? {
                continue;
            }
            let price = self.series.bar(index)?.close;
            let kind = match record.current_trade().state() {
                TradeState::New => OrderKind::Entry,
                TradeState::Opened | TradeState::Closed => OrderKind::Exit,
            };
            record.operate(index, price, amount)?;
            tracing::debug!(strategy = strategy.name(), index, %kind, %price, "order recorded");
        }

        tracing::debug!(
            strategy = strategy.name(),
            trades = record.trade_count(),
            open = !record.is_closed(),
            "run finished"
        );
        Ok(record)
    }
}
