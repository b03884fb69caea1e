//! Return-based criteria.

use crate::domain::criteria::AnalysisCriterion;
use crate::domain::error::EngineError;
use crate::domain::num::Num;
use crate::domain::trade::{Side, Trade};
use crate::domain::trading_record::TradingRecord;
use crate::ports::series_port::BarSeries;

/// Product of the gross returns of all closed trades. `1` means flat.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalProfitCriterion;

impl AnalysisCriterion for TotalProfitCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        Ok(trade.gross_return().unwrap_or_else(|| series.num_of(1.0)))
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        record
            .trades()
            .iter()
            .try_fold(series.num_of(1.0), |acc, trade| {
                Ok(acc * self.calculate_trade(series, trade)?)
            })
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_greater_than(b)
    }
}

/// Sum of absolute profits of all closed trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitLossCriterion;

impl AnalysisCriterion for ProfitLossCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        Ok(trade.profit().unwrap_or_else(|| series.num_of(0.0)))
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        record
            .trades()
            .iter()
            .try_fold(series.num_of(0.0), |acc, trade| {
                Ok(acc + self.calculate_trade(series, trade)?)
            })
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_greater_than(b)
    }
}

/// Gross return of holding a long position from the first to the last
/// retained bar. NaN on an empty series.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHoldCriterion;

impl BuyAndHoldCriterion {
    fn held(
        series: &dyn BarSeries,
        side: Side,
        from: usize,
        to: usize,
    ) -> Result<Num, EngineError> {
        let entry = series.bar(from)?.close;
        let exit = series.bar(to)?.close;
        Ok(match side {
            Side::Buy => exit / entry,
            Side::Sell => entry / exit,
        })
    }
}

impl AnalysisCriterion for BuyAndHoldCriterion {
    /// Holding over the span of `trade`, in its direction.
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        match (trade.entry(), trade.exit()) {
            (Some(entry), Some(exit)) => {
                BuyAndHoldCriterion::held(series, trade.starting_side(), entry.index, exit.index)
            }
            _ => Ok(series.num_of(1.0)),
        }
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        _record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        match series.end_index() {
            Some(end) => BuyAndHoldCriterion::held(series, Side::Buy, series.begin_index(), end),
            None => Ok(Num::NaN),
        }
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_greater_than(b)
    }
}

/// Ratio of another criterion's score to the score it gives a single
/// buy-and-hold trade over the whole series.
pub struct VersusBuyAndHoldCriterion {
    criterion: Box<dyn AnalysisCriterion>,
}

impl VersusBuyAndHoldCriterion {
    pub fn new(criterion: impl AnalysisCriterion + 'static) -> Self {
        VersusBuyAndHoldCriterion {
            criterion: Box::new(criterion),
        }
    }

    fn buy_and_hold_trade(series: &dyn BarSeries) -> Result<Option<Trade>, EngineError> {
        let Some(end) = series.end_index() else {
            return Ok(None);
        };
        let begin = series.begin_index();
        let trade = Trade::closed(
            Side::Buy,
            (begin, series.bar(begin)?.close),
            (end, series.bar(end)?.close),
            series.num_of(1.0),
        )?;
        Ok(Some(trade))
    }

    fn buy_and_hold_score(&self, series: &dyn BarSeries) -> Result<Num, EngineError> {
        match VersusBuyAndHoldCriterion::buy_and_hold_trade(series)? {
            Some(trade) => self.criterion.calculate_trade(series, &trade),
            None => Ok(Num::NaN),
        }
    }
}

impl AnalysisCriterion for VersusBuyAndHoldCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        Ok(self.criterion.calculate_trade(series, trade)? / self.buy_and_hold_score(series)?)
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        Ok(self.criterion.calculate(series, record)? / self.buy_and_hold_score(series)?)
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_greater_than(b)
    }
}
