//! Linear transaction cost: every order costs `a * traded_amount + b`.
//!
//! The traded amount starts at `initial_amount` and is carried across
//! trades: each trade pays its entry cost, the remainder grows by the trade's
//! gross return, then pays its exit cost.

use crate::domain::criteria::AnalysisCriterion;
use crate::domain::error::EngineError;
use crate::domain::num::Num;
use crate::domain::trade::Trade;
use crate::domain::trading_record::TradingRecord;
use crate::ports::series_port::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransactionCostCriterion {
    initial_amount: f64,
    a: f64,
    b: f64,
}

/// Coefficients converted into one series' backend.
struct CostModel {
    a: Num,
    b: Num,
}

impl CostModel {
    fn order_cost(&self, traded_amount: Num) -> Num {
        self.a * traded_amount + self.b
    }

    /// Total cost of `trade` starting from `amount`, and the amount left
    /// afterwards. An open trade pays only its entry cost.
    fn trade_cost(&self, trade: &Trade, amount: Num) -> (Num, Num) {
        if trade.is_new() {
            return (amount.num_of(0.0), amount);
        }
        let entry_cost = self.order_cost(amount);
        let remaining = amount - entry_cost;
        match trade.gross_return() {
            Some(gross) => {
                let grown = remaining * gross;
                let exit_cost = self.order_cost(grown);
                (entry_cost + exit_cost, grown - exit_cost)
            }
            None => (entry_cost, remaining),
        }
    }
}

impl LinearTransactionCostCriterion {
    /// `initial_amount` is the capital traded by the first order; `a` is the
    /// proportional cost and `b` the fixed cost per order.
    pub fn new(initial_amount: f64, a: f64, b: f64) -> Self {
        LinearTransactionCostCriterion { initial_amount, a, b }
    }

    /// Proportional cost only.
    pub fn proportional(initial_amount: f64, a: f64) -> Self {
        LinearTransactionCostCriterion::new(initial_amount, a, 0.0)
    }

    pub fn initial_amount(&self) -> f64 {
        self.initial_amount
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    fn model(&self, series: &dyn BarSeries) -> CostModel {
        CostModel {
            a: series.num_of(self.a),
            b: series.num_of(self.b),
        }
    }
}

impl AnalysisCriterion for LinearTransactionCostCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        let (cost, _) = self
            .model(series)
            .trade_cost(trade, series.num_of(self.initial_amount));
        Ok(cost)
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        let model = self.model(series);
        let mut amount = series.num_of(self.initial_amount);
        let mut total = series.num_of(0.0);
        for trade in record.trades() {
            let (cost, remaining) = model.trade_cost(trade, amount);
            total = total + cost;
            amount = remaining;
        }
        let (open_cost, _) = model.trade_cost(record.current_trade(), amount);
        Ok(total + open_cost)
    }

    /// Lower cost is better.
    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_less_than(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bar_series::InMemoryBarSeries;
    use crate::domain::num::NumBackend;
    use crate::domain::trade::Side;
    use approx::assert_relative_eq;

    fn series(backend: NumBackend) -> InMemoryBarSeries {
        InMemoryBarSeries::new("costs", backend)
    }

    fn record(backend: NumBackend, trades: &[(f64, f64)]) -> TradingRecord {
        let n = |v: f64| backend.num_of(v);
        let mut record = TradingRecord::new(Side::Buy);
        for (i, (entry, exit)) in trades.iter().enumerate() {
            record.enter(2 * i, n(*entry), n(1.0)).unwrap();
            record.exit(2 * i + 1, n(*exit), n(1.0)).unwrap();
        }
        record
    }

    #[test]
    fn flat_trade_costs_entry_plus_exit() {
        let s = series(NumBackend::Decimal);
        let criterion = LinearTransactionCostCriterion::proportional(1000.0, 0.01);
        let cost = criterion
            .calculate(&s, &record(NumBackend::Decimal, &[(100.0, 100.0)]))
            .unwrap();
        // 10 on entry, then 1% of the remaining 990
        assert_relative_eq!(cost.to_f64(), 19.9, epsilon = 1e-9);
    }

    #[test]
    fn zero_coefficients_cost_nothing() {
        let s = series(NumBackend::Double);
        let criterion = LinearTransactionCostCriterion::new(1000.0, 0.0, 0.0);
        let r = record(NumBackend::Double, &[(10.0, 12.0), (12.0, 9.0), (9.0, 9.5)]);
        assert!(criterion.calculate(&s, &r).unwrap().is_zero());
    }

    #[test]
    fn amount_carries_across_trades() {
        let s = series(NumBackend::Double);
        let criterion = LinearTransactionCostCriterion::new(1000.0, 0.005, 0.2);
        let r = record(NumBackend::Double, &[(100.0, 105.0), (100.0, 95.0)]);

        let mut amount = 1000.0_f64;
        let mut expected = 0.0;
        for gross in [1.05, 0.95] {
            let entry_cost = 0.005 * amount + 0.2;
            let grown = (amount - entry_cost) * gross;
            let exit_cost = 0.005 * grown + 0.2;
            expected += entry_cost + exit_cost;
            amount = grown - exit_cost;
        }
        assert_relative_eq!(
            criterion.calculate(&s, &r).unwrap().to_f64(),
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn open_trade_adds_entry_cost_only() {
        let s = series(NumBackend::Double);
        let criterion = LinearTransactionCostCriterion::proportional(1000.0, 0.01);
        let mut r = record(NumBackend::Double, &[(100.0, 100.0)]);
        let closed_only = criterion.calculate(&s, &r).unwrap().to_f64();

        let n = NumBackend::Double;
        r.enter(4, n.num_of(50.0), n.num_of(1.0)).unwrap();
        let with_open = criterion.calculate(&s, &r).unwrap().to_f64();
        // carried amount after the flat trade is 980.1
        assert_relative_eq!(with_open - closed_only, 9.801, epsilon = 1e-9);
    }

    #[test]
    fn single_trade_starts_from_initial_amount() {
        let s = series(NumBackend::Double);
        let criterion = LinearTransactionCostCriterion::proportional(1000.0, 0.01);
        let n = NumBackend::Double;
        let trade =
            Trade::closed(Side::Buy, (0, n.num_of(100.0)), (1, n.num_of(110.0)), n.num_of(1.0))
                .unwrap();
        // 10, then 1% of 990 * 1.1
        assert_relative_eq!(
            criterion.calculate_trade(&s, &trade).unwrap().to_f64(),
            10.0 + 10.89,
            epsilon = 1e-9
        );
        assert!(criterion.calculate_trade(&s, &Trade::new(Side::Buy)).unwrap().is_zero());
    }

    #[test]
    fn empty_record_costs_nothing() {
        let s = series(NumBackend::Decimal);
        let criterion = LinearTransactionCostCriterion::new(1000.0, 0.01, 1.0);
        assert!(criterion.calculate(&s, &TradingRecord::default()).unwrap().is_zero());
    }

    #[test]
    fn lower_is_better() {
        let criterion = LinearTransactionCostCriterion::proportional(1.0, 0.0);
        let n = NumBackend::Double;
        assert!(criterion.better_than(n.num_of(1.0), n.num_of(2.0)));
        assert!(!criterion.better_than(n.num_of(2.0), n.num_of(2.0)));
    }
}
