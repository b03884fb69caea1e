//! Memoizing decorators for [`Calculation`]s.
//!
//! Eviction policy: values are cached by absolute index. Before every lookup
//! the cache drops entries below the series' current `begin_index`, and a
//! request below that index fails with [`EngineError::IndexUnavailable`] even
//! if the value was computed before the bars were evicted. No approximate
//! recomputation is attempted.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::domain::error::EngineError;
use crate::domain::indicator::{Calculation, Indicator};
use crate::ports::series_port::{BarSeries, SeriesRef};

/// Sparse index → value store.
struct ValueCache<T> {
    values: RefCell<BTreeMap<usize, T>>,
}

impl<T: Clone> ValueCache<T> {
    fn new() -> Self {
        ValueCache {
            values: RefCell::new(BTreeMap::new()),
        }
    }

    fn get(&self, index: usize) -> Option<T> {
        self.values.borrow().get(&index).cloned()
    }

    fn insert(&self, index: usize, value: T) {
        self.values.borrow_mut().insert(index, value);
    }

    fn evict_before(&self, begin: usize) {
        let mut values = self.values.borrow_mut();
        if values.first_key_value().is_some_and(|(k, _)| *k < begin) {
            let kept = values.split_off(&begin);
            tracing::trace!(evicted = values.len(), begin, "dropped cached values");
            *values = kept;
        }
    }

    fn highest_below(&self, index: usize) -> Option<usize> {
        self.values
            .borrow()
            .range(..index)
            .next_back()
            .map(|(k, _)| *k)
    }

    fn len(&self) -> usize {
        self.values.borrow().len()
    }
}

/// Computes each index at most once and serves later requests from memory.
pub struct CachedIndicator<C: Calculation> {
    calculation: C,
    cache: ValueCache<C::Output>,
}

impl<C: Calculation> CachedIndicator<C> {
    pub fn new(calculation: C) -> Self {
        CachedIndicator {
            calculation,
            cache: ValueCache::new(),
        }
    }

    pub fn calculation(&self) -> &C {
        &self.calculation
    }

    /// Number of values currently held.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Evicts stale entries and validates `index`; returns the cached value
    /// if there is one.
    fn lookup(&self, index: usize) -> Result<Option<C::Output>, EngineError> {
        let series = self.calculation.series();
        self.cache.evict_before(series.begin_index());
        series.check_index(index)?;
        Ok(self.cache.get(index))
    }

    fn fill(
        &self,
        this: &dyn Indicator<Output = C::Output>,
        index: usize,
    ) -> Result<C::Output, EngineError> {
        if let Some(value) = self.cache.get(index) {
            return Ok(value);
        }
        let value = self.calculation.calculate(this, index)?;
        self.cache.insert(index, value.clone());
        Ok(value)
    }
}

impl<C: Calculation> Indicator for CachedIndicator<C> {
    type Output = C::Output;

    fn value(&self, index: usize) -> Result<C::Output, EngineError> {
        match self.lookup(index)? {
            Some(value) => Ok(value),
            None => self.fill(self, index),
        }
    }

    fn series(&self) -> &SeriesRef {
        self.calculation.series()
    }
}

/// Cache for formulas where `value(n)` depends on `value(n - 1)`.
///
/// On a miss at `n`, evaluation restarts after the highest cached index below
/// `n` (or at `begin_index`) and walks forward to `n`, so each step finds its
/// predecessor already cached. Formulas must treat `begin_index` as their
/// base case.
pub struct RecursiveCachedIndicator<C: Calculation> {
    inner: CachedIndicator<C>,
}

impl<C: Calculation> RecursiveCachedIndicator<C> {
    pub fn new(calculation: C) -> Self {
        RecursiveCachedIndicator {
            inner: CachedIndicator::new(calculation),
        }
    }

    pub fn calculation(&self) -> &C {
        self.inner.calculation()
    }

    pub fn cached_count(&self) -> usize {
        self.inner.cached_count()
    }
}

impl<C: Calculation> Indicator for RecursiveCachedIndicator<C> {
    type Output = C::Output;

    fn value(&self, index: usize) -> Result<C::Output, EngineError> {
        if let Some(value) = self.inner.lookup(index)? {
            return Ok(value);
        }
        let start = self
            .inner
            .cache
            .highest_below(index)
            .map_or(self.series().begin_index(), |k| k + 1);
        for i in start..index {
            self.inner.fill(self, i)?;
        }
        self.inner.fill(self, index)
    }

    fn series(&self) -> &SeriesRef {
        self.inner.series()
    }
}
