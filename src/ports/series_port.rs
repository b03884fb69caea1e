//! Bar series port trait.
//!
//! The engine only reads bars through this trait. Implementations are
//! append-only and may evict their oldest bars, advancing `begin_index`.

use std::rc::Rc;

use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::domain::num::{Num, NumBackend};

pub trait BarSeries {
    fn name(&self) -> &str;

    /// The bar at an absolute index. Indices below `begin_index` (evicted) or
    /// above `end_index` fail with [`EngineError::IndexUnavailable`].
    fn bar(&self, index: usize) -> Result<Bar, EngineError>;

    /// First retained index. Equals the number of bars evicted so far.
    fn begin_index(&self) -> usize;

    /// Number of retained bars.
    fn bar_count(&self) -> usize;

    fn backend(&self) -> NumBackend;

    /// Last retained index, `None` while the series is empty.
    fn end_index(&self) -> Option<usize> {
        (self.bar_count() > 0).then(|| self.begin_index() + self.bar_count() - 1)
    }

    fn is_empty(&self) -> bool {
        self.bar_count() == 0
    }

    fn num_of(&self, value: f64) -> Num {
        self.backend().num_of(value)
    }

    /// Fails with [`EngineError::IndexUnavailable`] unless `index` is retained.
    fn check_index(&self, index: usize) -> Result<(), EngineError> {
        match self.end_index() {
            Some(end) if (self.begin_index()..=end).contains(&index) => Ok(()),
            _ => Err(EngineError::IndexUnavailable {
                index,
                begin: self.begin_index(),
                bar_count: self.bar_count(),
            }),
        }
    }
}

/// Shared, read-only handle used by indicators, rules and the execution loop.
pub type SeriesRef = Rc<dyn BarSeries>;
