//! Counting criteria over closed trades.

use crate::domain::criteria::AnalysisCriterion;
use crate::domain::error::EngineError;
use crate::domain::num::Num;
use crate::domain::trade::Trade;
use crate::domain::trading_record::TradingRecord;
use crate::ports::series_port::BarSeries;

/// Number of closed trades. Fewer is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberOfTradesCriterion;

impl AnalysisCriterion for NumberOfTradesCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, _trade: &Trade) -> Result<Num, EngineError> {
        Ok(series.num_of(1.0))
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        Ok(series.backend().num_of_i64(record.trade_count() as i64))
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_less_than(b)
    }
}

/// Bars spent in closed trades, both ends included. Fewer is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberOfBarsCriterion;

impl AnalysisCriterion for NumberOfBarsCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        let bars = trade.bar_count().unwrap_or(0);
        Ok(series.backend().num_of_i64(bars as i64))
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        let bars: usize = record.trades().iter().filter_map(Trade::bar_count).sum();
        Ok(series.backend().num_of_i64(bars as i64))
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_less_than(b)
    }
}

/// Share of closed trades with a positive profit. NaN without trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinningTradesRatioCriterion;

fn is_winning(trade: &Trade) -> bool {
    trade.profit().is_some_and(|p| p.is_positive())
}

impl AnalysisCriterion for WinningTradesRatioCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        Ok(series.num_of(if is_winning(trade) { 1.0 } else { 0.0 }))
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        let total = record.trade_count();
        if total == 0 {
            return Ok(Num::NaN);
        }
        let winning = record.trades().iter().filter(|t| is_winning(t)).count();
        let backend = series.backend();
        Ok(backend.num_of_i64(winning as i64) / backend.num_of_i64(total as i64))
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_greater_than(b)
    }
}
