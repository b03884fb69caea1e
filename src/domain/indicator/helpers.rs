//! Structural indicators rules are built from: bar fields, constants, lagged
//! and cumulative values.

use std::rc::Rc;

use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::domain::indicator::{
    CachedIndicator, Calculation, Indicator, NumIndicator, RecursiveCachedIndicator,
};
use crate::domain::num::Num;
use crate::ports::series_port::{BarSeries, SeriesRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
    Typical,
}

impl PriceField {
    fn extract(self, bar: &Bar) -> Num {
        match self {
            PriceField::Open => bar.open,
            PriceField::High => bar.high,
            PriceField::Low => bar.low,
            PriceField::Close => bar.close,
            PriceField::Volume => bar.volume,
            PriceField::Typical => bar.typical_price(),
        }
    }
}

/// Reads one field of the bar at each index.
pub struct PriceCalculation {
    series: SeriesRef,
    field: PriceField,
}

impl PriceCalculation {
    pub fn new(series: SeriesRef, field: PriceField) -> Self {
        PriceCalculation { series, field }
    }

    pub fn field(&self) -> PriceField {
        self.field
    }
}

impl Calculation for PriceCalculation {
    type Output = Num;

    fn series(&self) -> &SeriesRef {
        &self.series
    }

    fn calculate(
        &self,
        _this: &dyn Indicator<Output = Num>,
        index: usize,
    ) -> Result<Num, EngineError> {
        Ok(self.field.extract(&self.series.bar(index)?))
    }
}

pub type PriceIndicator = CachedIndicator<PriceCalculation>;

pub fn price(series: &SeriesRef, field: PriceField) -> NumIndicator {
    Rc::new(PriceIndicator::new(PriceCalculation::new(series.clone(), field)))
}

pub fn open_price(series: &SeriesRef) -> NumIndicator {
    price(series, PriceField::Open)
}

pub fn high_price(series: &SeriesRef) -> NumIndicator {
    price(series, PriceField::High)
}

pub fn low_price(series: &SeriesRef) -> NumIndicator {
    price(series, PriceField::Low)
}

pub fn close_price(series: &SeriesRef) -> NumIndicator {
    price(series, PriceField::Close)
}

pub fn volume(series: &SeriesRef) -> NumIndicator {
    price(series, PriceField::Volume)
}

/// The same value at every retained index. Not cached.
pub struct ConstantIndicator {
    series: SeriesRef,
    value: Num,
}

impl ConstantIndicator {
    /// `value` is converted through the series' backend.
    pub fn new(series: &SeriesRef, value: f64) -> Self {
        ConstantIndicator {
            series: series.clone(),
            value: series.num_of(value),
        }
    }

    pub fn shared(series: &SeriesRef, value: f64) -> NumIndicator {
        Rc::new(ConstantIndicator::new(series, value))
    }
}

impl Indicator for ConstantIndicator {
    type Output = Num;

    fn value(&self, index: usize) -> Result<Num, EngineError> {
        self.series.check_index(index)?;
        Ok(self.value)
    }

    fn series(&self) -> &SeriesRef {
        &self.series
    }
}

/// `max(high - low, |high - prev_close|, |low - prev_close|)`; the first
/// retained bar has no previous close and yields `high - low`.
pub struct TrueRangeCalculation {
    series: SeriesRef,
}

impl Calculation for TrueRangeCalculation {
    type Output = Num;

    fn series(&self) -> &SeriesRef {
        &self.series
    }

    fn calculate(
        &self,
        _this: &dyn Indicator<Output = Num>,
        index: usize,
    ) -> Result<Num, EngineError> {
        let bar = self.series.bar(index)?;
        if index <= self.series.begin_index() {
            return Ok(bar.high - bar.low);
        }
        let prev_close = self.series.bar(index - 1)?.close;
        Ok(bar.true_range(prev_close))
    }
}

pub type TrueRangeIndicator = CachedIndicator<TrueRangeCalculation>;

pub fn true_range(series: &SeriesRef) -> NumIndicator {
    Rc::new(TrueRangeIndicator::new(TrueRangeCalculation {
        series: series.clone(),
    }))
}

/// Value of `source` `lag` bars earlier, clamped to the first retained index.
pub struct PreviousValueIndicator {
    source: NumIndicator,
    lag: usize,
}

impl PreviousValueIndicator {
    pub fn new(source: NumIndicator, lag: usize) -> Self {
        PreviousValueIndicator { source, lag }
    }
}

impl Indicator for PreviousValueIndicator {
    type Output = Num;

    fn value(&self, index: usize) -> Result<Num, EngineError> {
        self.series().check_index(index)?;
        let begin = self.series().begin_index();
        self.source.value(index.saturating_sub(self.lag).max(begin))
    }

    fn series(&self) -> &SeriesRef {
        self.source.series()
    }
}

/// Running sum of `source` from the first retained index.
pub struct CumulativeCalculation {
    source: NumIndicator,
}

impl Calculation for CumulativeCalculation {
    type Output = Num;

    fn series(&self) -> &SeriesRef {
        self.source.series()
    }

    fn calculate(
        &self,
        this: &dyn Indicator<Output = Num>,
        index: usize,
    ) -> Result<Num, EngineError> {
        let current = self.source.value(index)?;
        if index <= self.series().begin_index() {
            return Ok(current);
        }
        Ok(this.value(index - 1)? + current)
    }
}

pub type CumulativeIndicator = RecursiveCachedIndicator<CumulativeCalculation>;

pub fn cumulative(source: NumIndicator) -> CumulativeIndicator {
    RecursiveCachedIndicator::new(CumulativeCalculation { source })
}
