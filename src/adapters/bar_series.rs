//! In-memory, optionally bounded bar series.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use chrono::NaiveDateTime;

use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::domain::num::NumBackend;
use crate::ports::data_port::BarSource;
use crate::ports::series_port::BarSeries;

/// Append-only series. Appends take `&self` so indicators can hold the series
/// through a shared [`SeriesRef`](crate::ports::series_port::SeriesRef) while
/// new bars arrive.
#[derive(Debug)]
pub struct InMemoryBarSeries {
    name: String,
    backend: NumBackend,
    max_bar_count: Option<usize>,
    bars: RefCell<VecDeque<Bar>>,
    removed: Cell<usize>,
}

impl InMemoryBarSeries {
    pub fn new(name: impl Into<String>, backend: NumBackend) -> Self {
        InMemoryBarSeries {
            name: name.into(),
            backend,
            max_bar_count: None,
            bars: RefCell::new(VecDeque::new()),
            removed: Cell::new(0),
        }
    }

    /// Keeps at most `max_bar_count` bars, evicting the oldest on append.
    pub fn with_max_bar_count(
        name: impl Into<String>,
        backend: NumBackend,
        max_bar_count: usize,
    ) -> Self {
        InMemoryBarSeries {
            max_bar_count: Some(max_bar_count.max(1)),
            ..InMemoryBarSeries::new(name, backend)
        }
    }

    /// Builds a series from every bar of `source`.
    pub fn from_source(
        name: impl Into<String>,
        backend: NumBackend,
        max_bar_count: Option<usize>,
        source: &dyn BarSource,
    ) -> Result<Self, EngineError> {
        let series = match max_bar_count {
            Some(max) => InMemoryBarSeries::with_max_bar_count(name, backend, max),
            None => InMemoryBarSeries::new(name, backend),
        };
        for bar in source.fetch_bars(backend)? {
            series.add_bar(bar)?;
        }
        Ok(series)
    }

    pub fn max_bar_count(&self) -> Option<usize> {
        self.max_bar_count
    }

    /// Appends a bar and returns its absolute index.
    ///
    /// The bar must use this series' backend and end strictly after the
    /// current last bar.
    pub fn add_bar(&self, bar: Bar) -> Result<usize, EngineError> {
        bar.check_backend(self.backend)?;
        let index = self.removed.get() + self.bars.borrow().len();
        if let Some(last) = self.bars.borrow().back() {
            if bar.end_time <= last.end_time {
                return Err(EngineError::NonChronologicalBar {
                    index,
                    reason: format!(
                        "end time {} does not follow {}",
                        bar.end_time, last.end_time
                    ),
                });
            }
        }

        let mut bars = self.bars.borrow_mut();
        bars.push_back(bar);
        if let Some(max) = self.max_bar_count {
            let excess = bars.len().saturating_sub(max);
            if excess > 0 {
                bars.drain(..excess);
                self.removed.set(self.removed.get() + excess);
                tracing::debug!(
                    series = %self.name,
                    evicted = excess,
                    begin_index = self.removed.get(),
                    "evicted oldest bars"
                );
            }
        }
        Ok(index)
    }

    pub fn add_price_bar(
        &self,
        end_time: NaiveDateTime,
        ohlcv: [f64; 5],
    ) -> Result<usize, EngineError> {
        self.add_bar(Bar::from_f64(self.backend, end_time, ohlcv))
    }
}

impl BarSeries for InMemoryBarSeries {
    fn name(&self) -> &str {
        &self.name
    }

    fn bar(&self, index: usize) -> Result<Bar, EngineError> {
        self.check_index(index)?;
        let bars = self.bars.borrow();
        bars.get(index - self.removed.get())
            .copied()
            .ok_or(EngineError::IndexUnavailable {
                index,
                begin: self.removed.get(),
                bar_count: bars.len(),
            })
    }

    fn begin_index(&self) -> usize {
        self.removed.get()
    }

    fn bar_count(&self) -> usize {
        self.bars.borrow().len()
    }

    fn backend(&self) -> NumBackend {
        self.backend
    }
}
