//! Analysis criteria.
//!
//! An [`AnalysisCriterion`] scores a trade or a whole trading record against
//! the series it was produced on, and knows which of two scores is better.
//! [`AnalysisCriterion::choose_best`] ranks strategies by running each one
//! through a [`SeriesManager`].

pub mod drawdown;
pub mod profit;
pub mod trades;
pub mod transaction_cost;

pub use drawdown::{CashFlow, MaximumDrawdownCriterion};
pub use profit::{
    BuyAndHoldCriterion, ProfitLossCriterion, TotalProfitCriterion, VersusBuyAndHoldCriterion,
};
pub use trades::{NumberOfBarsCriterion, NumberOfTradesCriterion, WinningTradesRatioCriterion};
pub use transaction_cost::LinearTransactionCostCriterion;

use crate::domain::error::EngineError;
use crate::domain::execution::SeriesManager;
use crate::domain::num::Num;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use crate::domain::trading_record::TradingRecord;
use crate::ports::series_port::BarSeries;

pub trait AnalysisCriterion {
    /// Score of a single trade.
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError>;

    /// Score of a whole record: its closed trades plus, where the criterion
    /// defines it, the open current trade.
    fn calculate(&self, series: &dyn BarSeries, record: &TradingRecord) -> Result<Num, EngineError>;

    /// `true` when `a` is strictly better than `b`.
    fn better_than(&self, a: Num, b: Num) -> bool;

    /// Runs every strategy and returns the one with the best score. Ties keep
    /// the earlier strategy; an empty slice gives `None`.
    fn choose_best<'s>(
        &self,
        manager: &SeriesManager,
        strategies: &'s [Strategy],
    ) -> Result<Option<&'s Strategy>, EngineError> {
        let series = manager.series().as_ref();
        let mut best: Option<(&'s Strategy, Num)> = None;
        for strategy in strategies {
            let score = self.calculate(series, &manager.run(strategy)?)?;
            tracing::debug!(strategy = strategy.name(), %score, "strategy scored");
            best = match best {
                Some((_, best_score)) if !self.better_than(score, best_score) => best,
                _ => Some((strategy, score)),
            };
        }
        Ok(best.map(|(strategy, _)| strategy))
    }
}

impl<C: AnalysisCriterion + ?Sized> AnalysisCriterion for Box<C> {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        (**self).calculate_trade(series, trade)
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        (**self).calculate(series, record)
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        (**self).better_than(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bar_series::InMemoryBarSeries;
    use crate::domain::num::NumBackend;
    use crate::domain::rule::{BooleanRule, FixedIndexRule};
    use chrono::{Duration, NaiveDate};
    use std::rc::Rc;

    fn manager(len: usize) -> SeriesManager {
        let series = InMemoryBarSeries::new("rank", NumBackend::Double);
        let start = NaiveDate::from_ymd_opt(2021, 1, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for i in 0..len {
            series
                .add_price_bar(start + Duration::days(i as i64), [10.0; 5])
                .unwrap();
        }
        SeriesManager::new(Rc::new(series))
    }

    /// Score = number of closed trades; higher is better.
    struct MostTrades;

    impl AnalysisCriterion for MostTrades {
        fn calculate_trade(
            &self,
            series: &dyn BarSeries,
            _trade: &Trade,
        ) -> Result<Num, EngineError> {
            Ok(series.num_of(1.0))
        }

        fn calculate(
            &self,
            series: &dyn BarSeries,
            record: &TradingRecord,
        ) -> Result<Num, EngineError> {
            Ok(series.num_of(record.trade_count() as f64))
        }

        fn better_than(&self, a: Num, b: Num) -> bool {
            a.is_greater_than(b)
        }
    }

    fn with_trades(name: &str, exits: &[usize]) -> Strategy {
        let entries: Vec<usize> = exits.iter().map(|e| e - 1).collect();
        Strategy::new(name, FixedIndexRule::new(entries), FixedIndexRule::new(exits.to_vec()))
    }

    #[test]
    fn choose_best_keeps_first_of_ties() {
        let m = manager(20);
        let strategies = vec![
            with_trades("two", &[1, 3]),
            with_trades("three-a", &[1, 3, 5]),
            with_trades("three-b", &[7, 9, 11]),
        ];
        let best = MostTrades.choose_best(&m, &strategies).unwrap().unwrap();
        assert_eq!(best.name(), "three-a");
    }

    #[test]
    fn choose_best_of_nothing_is_none() {
        let m = manager(5);
        assert!(MostTrades.choose_best(&m, &[]).unwrap().is_none());
    }

    #[test]
    fn choose_best_of_one() {
        let m = manager(5);
        let only = [Strategy::new("never", BooleanRule::FALSE, BooleanRule::FALSE)];
        let best = MostTrades.choose_best(&m, &only).unwrap();
        assert_eq!(best.map(Strategy::name), Some("never"));
    }

    #[test]
    fn boxed_criterion_delegates() {
        let boxed: Box<dyn AnalysisCriterion> = Box::new(MostTrades);
        let n = NumBackend::Double;
        assert!(boxed.better_than(n.num_of(2.0), n.num_of(1.0)));
    }
}
