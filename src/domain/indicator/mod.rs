//! Indicator graph.
//!
//! An [`Indicator`] is a pure function of the bar history up to an index. Raw
//! formulas implement [`Calculation`] and are wrapped by one of the caching
//! decorators in [`cache`]:
//! - [`CachedIndicator`]: memoizes each index on first request
//! - [`RecursiveCachedIndicator`]: for formulas that read their own previous
//!   value; fills forward iteratively so stack depth does not grow with the
//!   index
//!
//! [`helpers`] holds the price, constant and structural indicators rules are
//! usually built from.

pub mod cache;
pub mod helpers;

use std::rc::Rc;

use crate::domain::error::EngineError;
use crate::domain::num::Num;
use crate::ports::series_port::SeriesRef;

pub use cache::{CachedIndicator, RecursiveCachedIndicator};

pub trait Indicator {
    type Output: Clone;

    /// Value at an absolute series index. Calling twice returns equal values.
    fn value(&self, index: usize) -> Result<Self::Output, EngineError>;

    fn series(&self) -> &SeriesRef;

    /// Converts a literal into the series' backend.
    fn num_of(&self, value: f64) -> Num {
        self.series().num_of(value)
    }
}

/// Shared numeric indicator, as held by rules and composite indicators.
pub type NumIndicator = Rc<dyn Indicator<Output = Num>>;

/// Shared boolean indicator.
pub type BoolIndicator = Rc<dyn Indicator<Output = bool>>;

/// A raw formula. `this` is the decorated indicator wrapping the formula, so
/// self-referencing formulas read earlier values through the cache.
pub trait Calculation {
    type Output: Clone;

    fn series(&self) -> &SeriesRef;

    fn calculate(
        &self,
        this: &dyn Indicator<Output = Self::Output>,
        index: usize,
    ) -> Result<Self::Output, EngineError>;
}
