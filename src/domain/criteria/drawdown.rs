//! Cash flow and maximum drawdown.

use crate::domain::criteria::AnalysisCriterion;
use crate::domain::error::EngineError;
use crate::domain::num::Num;
use crate::domain::trade::{Side, Trade};
use crate::domain::trading_record::TradingRecord;
use crate::ports::series_port::BarSeries;

/// Relative equity at every retained index, starting at `1`.
///
/// While a trade is open the equity follows the close price relative to the
/// entry price (inverted for short trades); between trades it stays flat.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlow {
    begin: usize,
    values: Vec<Num>,
}

impl CashFlow {
    pub fn new(series: &dyn BarSeries, record: &TradingRecord) -> Result<Self, EngineError> {
        CashFlow::from_trades(series, record.trades())
    }

    /// Builds the flow from closed trades in chronological order. Open
    /// trades are ignored.
    pub fn from_trades(series: &dyn BarSeries, trades: &[Trade]) -> Result<Self, EngineError> {
        let begin = series.begin_index();
        let mut values = Vec::with_capacity(series.bar_count());
        if series.is_empty() {
            return Ok(CashFlow { begin, values });
        }
        values.push(series.num_of(1.0));

        for trade in trades {
            let (Some(entry), Some(exit)) = (trade.entry(), trade.exit()) else {
                continue;
            };
            series.check_index(entry.index)?;
            series.check_index(exit.index)?;
            extend_flat(&mut values, entry.index - begin + 1);
            let base = values[entry.index - begin];
            for index in (entry.index + 1)..=exit.index {
                if index - begin < values.len() {
                    continue;
                }
                let close = series.bar(index)?.close;
                let ratio = match trade.starting_side() {
                    Side::Buy => close / entry.price,
                    Side::Sell => entry.price / close,
                };
                values.push(base * ratio);
            }
        }

        extend_flat(&mut values, series.bar_count());
        Ok(CashFlow { begin, values })
    }

    /// Equity at an absolute index, `None` outside the covered range.
    pub fn value(&self, index: usize) -> Option<Num> {
        index
            .checked_sub(self.begin)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    pub fn values(&self) -> &[Num] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest peak-to-trough loss as a fraction of the peak.
    pub fn maximum_drawdown(&self) -> Option<Num> {
        let first = *self.values.first()?;
        let mut peak = first;
        let mut max_dd = first.num_of(0.0);
        for &value in &self.values {
            if value.is_greater_than(peak) {
                peak = value;
            } else if peak.is_positive() {
                let dd = (peak - value) / peak;
                if dd.is_greater_than(max_dd) {
                    max_dd = dd;
                }
            }
        }
        Some(max_dd)
    }
}

/// Repeats the last value until `values` holds `len` entries.
fn extend_flat(values: &mut Vec<Num>, len: usize) {
    if let Some(&last) = values.last() {
        values.resize(len.max(values.len()), last);
    }
}

/// Maximum drawdown of the record's cash flow. Lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumDrawdownCriterion;

impl AnalysisCriterion for MaximumDrawdownCriterion {
    fn calculate_trade(&self, series: &dyn BarSeries, trade: &Trade) -> Result<Num, EngineError> {
        let flow = CashFlow::from_trades(series, std::slice::from_ref(trade))?;
        Ok(flow.maximum_drawdown().unwrap_or_else(|| series.num_of(0.0)))
    }

    fn calculate(
        &self,
        series: &dyn BarSeries,
        record: &TradingRecord,
    ) -> Result<Num, EngineError> {
        let flow = CashFlow::new(series, record)?;
        Ok(flow.maximum_drawdown().unwrap_or_else(|| series.num_of(0.0)))
    }

    fn better_than(&self, a: Num, b: Num) -> bool {
        a.is_less_than(b)
    }
}
