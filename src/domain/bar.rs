//! OHLCV bar representation.

use chrono::NaiveDateTime;

use crate::domain::error::EngineError;
use crate::domain::num::{Num, NumBackend};

/// One immutable observation. All prices and the volume share one backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub end_time: NaiveDateTime,
    pub open: Num,
    pub high: Num,
    pub low: Num,
    pub close: Num,
    pub volume: Num,
}

impl Bar {
    pub fn new(
        end_time: NaiveDateTime,
        open: Num,
        high: Num,
        low: Num,
        close: Num,
        volume: Num,
    ) -> Self {
        Bar {
            end_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Builds a bar from native prices in the given backend.
    pub fn from_f64(
        backend: NumBackend,
        end_time: NaiveDateTime,
        ohlcv: [f64; 5],
    ) -> Self {
        let [open, high, low, close, volume] = ohlcv.map(|v| backend.num_of(v));
        Bar::new(end_time, open, high, low, close, volume)
    }

    /// Checks that every field belongs to `backend` (NaN fits any backend).
    pub fn check_backend(&self, backend: NumBackend) -> Result<(), EngineError> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        match fields
            .iter()
            .filter_map(Num::backend)
            .find(|b| *b != backend)
        {
            Some(other) => Err(EngineError::TypeMismatch {
                op: "add_bar",
                left: backend,
                right: other,
            }),
            None => Ok(()),
        }
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> Num {
        (self.high + self.low + self.close) / self.close.num_of(3.0)
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: Num) -> Num {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    fn sample_bar(backend: NumBackend) -> Bar {
        Bar::from_f64(backend, at(15), [100.0, 110.0, 90.0, 105.0, 50_000.0])
    }

    #[test]
    fn typical_price() {
        let bar = sample_bar(NumBackend::Double);
        // (110 + 90 + 105) / 3 = 101.666...
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((bar.typical_price().to_f64() - expected).abs() < 1e-12);
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar(NumBackend::Decimal);
        let prev = NumBackend::Decimal.num_of(100.0);
        assert!(bar.true_range(prev).is_equal(NumBackend::Decimal.num_of(20.0)));
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar(NumBackend::Decimal);
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        let prev = NumBackend::Decimal.num_of(70.0);
        assert!(bar.true_range(prev).is_equal(NumBackend::Decimal.num_of(40.0)));
    }

    #[test]
    fn true_range_with_missing_close_is_nan() {
        let bar = sample_bar(NumBackend::Double);
        assert!(bar.true_range(Num::NaN).is_nan());
    }

    #[test]
    fn check_backend_rejects_mixed_fields() {
        let mut bar = sample_bar(NumBackend::Decimal);
        assert!(bar.check_backend(NumBackend::Decimal).is_ok());
        bar.volume = NumBackend::Double.num_of(1.0);
        assert!(matches!(
            bar.check_backend(NumBackend::Decimal),
            Err(EngineError::TypeMismatch { right: NumBackend::Double, .. })
        ));
    }

    #[test]
    fn nan_fields_fit_any_backend() {
        let bar = Bar::from_f64(NumBackend::Double, at(18), [f64::NAN; 5]);
        assert!(bar.check_backend(NumBackend::Decimal).is_ok());
    }
}
