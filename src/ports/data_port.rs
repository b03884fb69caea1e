//! Bar source port trait.

use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::domain::num::NumBackend;

pub trait BarSource {
    /// Loads every bar in chronological order, built with `backend`.
    fn fetch_bars(&self, backend: NumBackend) -> Result<Vec<Bar>, EngineError>;
}
