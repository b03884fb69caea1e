//! Strategy: a named pair of entry and exit rules.

use std::fmt;

use crate::domain::error::EngineError;
use crate::domain::rule::{BoxedRule, Rule};
use crate::domain::trade::TradeState;
use crate::domain::trading_record::TradingRecord;

pub struct Strategy {
    name: String,
    entry_rule: BoxedRule,
    exit_rule: BoxedRule,
    unstable_period: usize,
}

impl Strategy {
    pub fn new(
        name: impl Into<String>,
        entry_rule: impl Rule + 'static,
        exit_rule: impl Rule + 'static,
    ) -> Self {
        Strategy {
            name: name.into(),
            entry_rule: Box::new(entry_rule),
            exit_rule: Box::new(exit_rule),
            unstable_period: 0,
        }
    }

    /// Bars at indices below `unstable_period` never trigger an order, e.g.
    /// while a long-window indicator is still warming up.
    pub fn with_unstable_period(mut self, unstable_period: usize) -> Self {
        self.unstable_period = unstable_period;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unstable_period(&self) -> usize {
        self.unstable_period
    }

    pub fn is_unstable_at(&self, index: usize) -> bool {
        index < self.unstable_period
    }

    pub fn should_enter(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        if self.is_unstable_at(index) {
            return Ok(false);
        }
        self.entry_rule.is_satisfied(index, record)
    }

    pub fn should_exit(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        if self.is_unstable_at(index) {
            return Ok(false);
        }
        self.exit_rule.is_satisfied(index, record)
    }

    /// Consults exactly one rule: entry while the current trade is new,
    /// exit while it is opened.
    pub fn should_operate(
        &self,
        index: usize,
        record: &TradingRecord,
    ) -> Result<bool, EngineError> {
        match record.current_trade().state() {
            TradeState::New => self.should_enter(index, Some(record)),
            TradeState::Opened | TradeState::Closed => self.should_exit(index, Some(record)),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("unstable_period", &self.unstable_period)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::NumBackend;
    use crate::domain::rule::{BooleanRule, FixedIndexRule};
    use crate::domain::trade::Side;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Always true; counts how often it was asked.
    struct Probe(Rc<Cell<usize>>);

    impl Rule for Probe {
        fn is_satisfied(
            &self,
            _index: usize,
            _record: Option<&TradingRecord>,
        ) -> Result<bool, EngineError> {
            self.0.set(self.0.get() + 1);
            Ok(true)
        }
    }

    #[test]
    fn should_operate_consults_one_rule_by_state() {
        let entries = Rc::new(Cell::new(0));
        let exits = Rc::new(Cell::new(0));
        let strategy = Strategy::new("probe", Probe(entries.clone()), Probe(exits.clone()));
        let mut record = TradingRecord::new(Side::Buy);

        assert!(strategy.should_operate(0, &record).unwrap());
        assert_eq!((entries.get(), exits.get()), (1, 0));

        let n = NumBackend::Double;
        record.enter(0, n.num_of(1.0), n.num_of(1.0)).unwrap();
        assert!(strategy.should_operate(1, &record).unwrap());
        assert_eq!((entries.get(), exits.get()), (1, 1));
    }

    #[test]
    fn unstable_period_blocks_both_rules() {
        let strategy =
            Strategy::new("warmup", BooleanRule::TRUE, BooleanRule::TRUE).with_unstable_period(3);
        assert!(!strategy.should_enter(2, None).unwrap());
        assert!(!strategy.should_exit(2, None).unwrap());
        assert!(strategy.should_enter(3, None).unwrap());
    }

    #[test]
    fn fixed_index_strategy() {
        let strategy = Strategy::new("fixed", FixedIndexRule::new([1]), FixedIndexRule::new([4]));
        assert!(!strategy.should_enter(0, None).unwrap());
        assert!(strategy.should_enter(1, None).unwrap());
        assert!(strategy.should_exit(4, None).unwrap());
        assert_eq!(strategy.name(), "fixed");
        assert!(format!("{strategy:?}").contains("fixed"));
    }
}
