//! Trading rules.
//!
//! A [`Rule`] decides, for a bar index and the trading record in progress,
//! whether to act. Rules compose through [`RuleExt`]:
//! - comparison: [`OverIndicatorRule`], [`UnderIndicatorRule`],
//!   [`CrossedUpIndicatorRule`], [`CrossedDownIndicatorRule`]
//! - trend: [`IsRisingRule`], [`IsFallingRule`]
//! - position: [`StopLossRule`], [`StopGainRule`]
//! - composite: [`AndRule`], [`OrRule`], [`XorRule`], [`NotRule`]
//! - fixed: [`BooleanRule`], [`FixedIndexRule`]

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::domain::error::EngineError;
use crate::domain::indicator::NumIndicator;
use crate::domain::indicator::helpers::{ConstantIndicator, close_price};
use crate::domain::num::Num;
use crate::domain::trade::Side;
use crate::domain::trading_record::TradingRecord;
use crate::ports::series_port::{BarSeries, SeriesRef};

pub trait Rule {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError>;
}

pub type BoxedRule = Box<dyn Rule>;

impl<R: Rule + ?Sized> Rule for Box<R> {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        (**self).is_satisfied(index, record)
    }
}

fn traced(rule: &str, index: usize, satisfied: bool) -> Result<bool, EngineError> {
    tracing::trace!(rule, index, satisfied, "rule evaluated");
    Ok(satisfied)
}

/// Builder methods available on every rule.
pub trait RuleExt: Rule + Sized + 'static {
    fn and<R: Rule + 'static>(self, other: R) -> AndRule {
        AndRule::new(self, other)
    }

    fn or<R: Rule + 'static>(self, other: R) -> OrRule {
        OrRule::new(self, other)
    }

    fn xor<R: Rule + 'static>(self, other: R) -> XorRule {
        XorRule::new(self, other)
    }

    fn negate(self) -> NotRule {
        NotRule::new(self)
    }

    fn boxed(self) -> BoxedRule {
        Box::new(self)
    }
}

impl<R: Rule + 'static> RuleExt for R {}

/// Always satisfied, or never.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanRule(pub bool);

impl BooleanRule {
    pub const TRUE: BooleanRule = BooleanRule(true);
    pub const FALSE: BooleanRule = BooleanRule(false);
}

impl Rule for BooleanRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        traced("BooleanRule", index, self.0)
    }
}

/// Satisfied exactly at the listed indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIndexRule {
    indices: BTreeSet<usize>,
}

impl FixedIndexRule {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        FixedIndexRule {
            indices: indices.into_iter().collect(),
        }
    }
}

impl Rule for FixedIndexRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        traced("FixedIndexRule", index, self.indices.contains(&index))
    }
}

/// first > second
pub struct OverIndicatorRule {
    first: NumIndicator,
    second: NumIndicator,
}

impl OverIndicatorRule {
    pub fn new(first: NumIndicator, second: NumIndicator) -> Self {
        OverIndicatorRule { first, second }
    }

    pub fn threshold(first: NumIndicator, threshold: f64) -> Self {
        let second = Rc::new(ConstantIndicator::new(first.series(), threshold));
        OverIndicatorRule::new(first, second)
    }
}

impl Rule for OverIndicatorRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied = self
            .first
            .value(index)?
            .is_greater_than(self.second.value(index)?);
        traced("OverIndicatorRule", index, satisfied)
    }
}

/// first < second
pub struct UnderIndicatorRule {
    first: NumIndicator,
    second: NumIndicator,
}

impl UnderIndicatorRule {
    pub fn new(first: NumIndicator, second: NumIndicator) -> Self {
        UnderIndicatorRule { first, second }
    }

    pub fn threshold(first: NumIndicator, threshold: f64) -> Self {
        let second = Rc::new(ConstantIndicator::new(first.series(), threshold));
        UnderIndicatorRule::new(first, second)
    }
}

impl Rule for UnderIndicatorRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied = self
            .first
            .value(index)?
            .is_less_than(self.second.value(index)?);
        traced("UnderIndicatorRule", index, satisfied)
    }
}

/// Reads `(first, second)` at `index` and `index - 1`; `None` at the first
/// retained index.
fn pair_with_previous(
    first: &NumIndicator,
    second: &NumIndicator,
    index: usize,
) -> Result<Option<[(Num, Num); 2]>, EngineError> {
    if index <= first.series().begin_index() {
        return Ok(None);
    }
    let prev = (first.value(index - 1)?, second.value(index - 1)?);
    let curr = (first.value(index)?, second.value(index)?);
    Ok(Some([prev, curr]))
}

/// first moves from at-or-below second to above it.
pub struct CrossedUpIndicatorRule {
    first: NumIndicator,
    second: NumIndicator,
}

impl CrossedUpIndicatorRule {
    pub fn new(first: NumIndicator, second: NumIndicator) -> Self {
        CrossedUpIndicatorRule { first, second }
    }
}

impl Rule for CrossedUpIndicatorRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied = match pair_with_previous(&self.first, &self.second, index)? {
            Some([(f0, s0), (f1, s1)]) => f1.is_greater_than(s1) && f0.is_less_than_or_equal(s0),
            None => false,
        };
        traced("CrossedUpIndicatorRule", index, satisfied)
    }
}

/// first moves from at-or-above second to below it.
pub struct CrossedDownIndicatorRule {
    first: NumIndicator,
    second: NumIndicator,
}

impl CrossedDownIndicatorRule {
    pub fn new(first: NumIndicator, second: NumIndicator) -> Self {
        CrossedDownIndicatorRule { first, second }
    }
}

impl Rule for CrossedDownIndicatorRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied = match pair_with_previous(&self.first, &self.second, index)? {
            Some([(f0, s0), (f1, s1)]) => f1.is_less_than(s1) && f0.is_greater_than_or_equal(s0),
            None => false,
        };
        traced("CrossedDownIndicatorRule", index, satisfied)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Rising,
    Falling,
}

/// Share of steps within the last `bar_count` bars moving in `direction`.
fn trend_ratio(
    source: &NumIndicator,
    bar_count: usize,
    index: usize,
    direction: Direction,
) -> Result<f64, EngineError> {
    let begin = source.series().begin_index();
    let start = index.saturating_sub(bar_count - 1).max(begin);
    let mut count = 0usize;
    for i in start..=index {
        let curr = source.value(i)?;
        let prev = source.value(i.saturating_sub(1).max(begin))?;
        let moved = match direction {
            Direction::Rising => curr.is_greater_than(prev),
            Direction::Falling => curr.is_less_than(prev),
        };
        if moved {
            count += 1;
        }
    }
    Ok(count as f64 / bar_count as f64)
}

fn clamp_strength(min_strength: f64) -> f64 {
    if min_strength >= 1.0 { 0.99 } else { min_strength }
}

/// Satisfied when at least `min_strength` of the last `bar_count` steps rise.
/// A strength of `1` or more means strictly rising and is clamped to `0.99`.
pub struct IsRisingRule {
    source: NumIndicator,
    bar_count: usize,
    min_strength: f64,
}

impl IsRisingRule {
    pub fn new(source: NumIndicator, bar_count: usize) -> Self {
        IsRisingRule::with_strength(source, bar_count, 1.0)
    }

    pub fn with_strength(source: NumIndicator, bar_count: usize, min_strength: f64) -> Self {
        IsRisingRule {
            source,
            bar_count: bar_count.max(1),
            min_strength: clamp_strength(min_strength),
        }
    }
}

impl Rule for IsRisingRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let ratio = trend_ratio(&self.source, self.bar_count, index, Direction::Rising)?;
        traced("IsRisingRule", index, ratio >= self.min_strength)
    }
}

/// Mirror of [`IsRisingRule`] for falling values.
pub struct IsFallingRule {
    source: NumIndicator,
    bar_count: usize,
    min_strength: f64,
}

impl IsFallingRule {
    pub fn new(source: NumIndicator, bar_count: usize) -> Self {
        IsFallingRule::with_strength(source, bar_count, 1.0)
    }

    pub fn with_strength(source: NumIndicator, bar_count: usize, min_strength: f64) -> Self {
        IsFallingRule {
            source,
            bar_count: bar_count.max(1),
            min_strength: clamp_strength(min_strength),
        }
    }
}

impl Rule for IsFallingRule {
    fn is_satisfied(
        &self,
        index: usize,
        _record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let ratio = trend_ratio(&self.source, self.bar_count, index, Direction::Falling)?;
        traced("IsFallingRule", index, ratio >= self.min_strength)
    }
}

/// Entry price of the record's open trade, with its side.
fn open_entry(record: Option<&TradingRecord>) -> Option<(Side, Num)> {
    let trade = record?.current_trade();
    trade
        .entry()
        .filter(|_| trade.is_opened())
        .map(|o| (o.side, o.price))
}

/// Satisfied when the open trade has lost `loss_pct` percent.
pub struct StopLossRule {
    price: NumIndicator,
    loss_pct: Num,
}

impl StopLossRule {
    pub fn new(price: NumIndicator, loss_pct: f64) -> Self {
        let loss_pct = price.num_of(loss_pct);
        StopLossRule { price, loss_pct }
    }
}

impl Rule for StopLossRule {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied = match open_entry(record) {
            None => false,
            Some((side, entry)) => {
                let hundred = self.price.num_of(100.0);
                let current = self.price.value(index)?;
                match side {
                    Side::Buy => current
                        .is_less_than_or_equal(entry * (hundred - self.loss_pct) / hundred),
                    Side::Sell => current
                        .is_greater_than_or_equal(entry * (hundred + self.loss_pct) / hundred),
                }
            }
        };
        traced("StopLossRule", index, satisfied)
    }
}

/// Satisfied when the open trade has gained `gain_pct` percent.
pub struct StopGainRule {
    price: NumIndicator,
    gain_pct: Num,
}

impl StopGainRule {
    pub fn new(price: NumIndicator, gain_pct: f64) -> Self {
        let gain_pct = price.num_of(gain_pct);
        StopGainRule { price, gain_pct }
    }
}

impl Rule for StopGainRule {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied = match open_entry(record) {
            None => false,
            Some((side, entry)) => {
                let hundred = self.price.num_of(100.0);
                let current = self.price.value(index)?;
                match side {
                    Side::Buy => current
                        .is_greater_than_or_equal(entry * (hundred + self.gain_pct) / hundred),
                    Side::Sell => current
                        .is_less_than_or_equal(entry * (hundred - self.gain_pct) / hundred),
                }
            }
        };
        traced("StopGainRule", index, satisfied)
    }
}

/// Short-circuits on the first unsatisfied side.
pub struct AndRule {
    left: BoxedRule,
    right: BoxedRule,
}

impl AndRule {
    pub fn new(left: impl Rule + 'static, right: impl Rule + 'static) -> Self {
        AndRule {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl Rule for AndRule {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied =
            self.left.is_satisfied(index, record)? && self.right.is_satisfied(index, record)?;
        traced("AndRule", index, satisfied)
    }
}

/// Short-circuits on the first satisfied side.
pub struct OrRule {
    left: BoxedRule,
    right: BoxedRule,
}

impl OrRule {
    pub fn new(left: impl Rule + 'static, right: impl Rule + 'static) -> Self {
        OrRule {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl Rule for OrRule {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied =
            self.left.is_satisfied(index, record)? || self.right.is_satisfied(index, record)?;
        traced("OrRule", index, satisfied)
    }
}

pub struct XorRule {
    left: BoxedRule,
    right: BoxedRule,
}

impl XorRule {
    pub fn new(left: impl Rule + 'static, right: impl Rule + 'static) -> Self {
        XorRule {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl Rule for XorRule {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied =
            self.left.is_satisfied(index, record)? ^ self.right.is_satisfied(index, record)?;
        traced("XorRule", index, satisfied)
    }
}

pub struct NotRule {
    inner: BoxedRule,
}

impl NotRule {
    pub fn new(inner: impl Rule + 'static) -> Self {
        NotRule {
            inner: Box::new(inner),
        }
    }
}

impl Rule for NotRule {
    fn is_satisfied(
        &self,
        index: usize,
        record: Option<&TradingRecord>,
    ) -> Result<bool, EngineError> {
        let satisfied = !self.inner.is_satisfied(index, record)?;
        traced("NotRule", index, satisfied)
    }
}

/// close > threshold
pub fn close_above(series: &SeriesRef, threshold: f64) -> OverIndicatorRule {
    OverIndicatorRule::threshold(close_price(series), threshold)
}

/// close < threshold
pub fn close_below(series: &SeriesRef, threshold: f64) -> UnderIndicatorRule {
    UnderIndicatorRule::threshold(close_price(series), threshold)
}
