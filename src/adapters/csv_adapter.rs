//! CSV file bar source.
//!
//! Expected columns, with a header row: `time,open,high,low,close,volume`.
//! Times are `%Y-%m-%d %H:%M:%S`, or `%Y-%m-%d` for daily bars (taken as
//! midnight).

use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::domain::num::{Num, NumBackend};
use crate::ports::data_port::BarSource;

const COLUMNS: [&str; 6] = ["time", "open", "high", "low", "close", "volume"];

pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

fn parse_time(text: &str) -> Result<NaiveDateTime, EngineError> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| EngineError::DataSource {
            reason: format!("invalid time {text:?}: {e}"),
        })
}

fn field<'r>(
    record: &'r csv::StringRecord,
    column: usize,
    line: u64,
) -> Result<&'r str, EngineError> {
    record.get(column).ok_or_else(|| EngineError::DataSource {
        reason: format!("line {line}: missing {} column", COLUMNS[column]),
    })
}

impl BarSource for CsvBarSource {
    fn fetch_bars(&self, backend: NumBackend) -> Result<Vec<Bar>, EngineError> {
        let content = fs::read_to_string(&self.path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EngineError::DataSource {
                reason: format!("CSV parse error: {e}"),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let end_time = parse_time(field(&record, 0, line)?)?;
            let mut values = [Num::NaN; 5];
            for (i, value) in values.iter_mut().enumerate() {
                *value = backend.parse(field(&record, i + 1, line)?)?;
            }
            let [open, high, low, close, volume] = values;
            bars.push(Bar::new(end_time, open, high, low, close, volume));
        }

        bars.sort_by_key(|b| b.end_time);
        tracing::debug!(path = %self.path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn reads_and_sorts_bars() {
        let file = create_temp_csv(
            "time,open,high,low,close,volume\n\
             2024-01-03,11,12,10,11.5,900\n\
             2024-01-02,10,11,9,10.25,1000\n",
        );
        let bars = CsvBarSource::new(file.path())
            .fetch_bars(NumBackend::Decimal)
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].end_time,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(bars[0].close, NumBackend::Decimal.parse("10.25").unwrap());
        assert_eq!(bars[1].volume.backend(), Some(NumBackend::Decimal));
    }

    #[test]
    fn reads_intraday_times() {
        let file = create_temp_csv(
            "time,open,high,low,close,volume\n2024-01-02 14:30:00,1,2,0.5,1.5,10\n",
        );
        let bars = CsvBarSource::new(file.path())
            .fetch_bars(NumBackend::Double)
            .unwrap();
        assert_eq!(
            bars[0].end_time,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(14, 30, 0).unwrap()
        );
        assert_eq!(bars[0].close, NumBackend::Double.num_of(1.5));
    }

    #[test]
    fn nan_cells_become_nan() {
        let file = create_temp_csv("time,open,high,low,close,volume\n2024-01-02,1,2,0.5,NaN,10\n");
        let bars = CsvBarSource::new(file.path())
            .fetch_bars(NumBackend::Decimal)
            .unwrap();
        assert!(bars[0].close.is_nan());
    }

    #[test]
    fn bad_time_is_a_data_source_error() {
        let file = create_temp_csv("time,open,high,low,close,volume\n02/01/2024,1,2,0.5,1.5,10\n");
        let result = CsvBarSource::new(file.path()).fetch_bars(NumBackend::Double);
        assert!(matches!(result, Err(EngineError::DataSource { .. })));
    }

    #[test]
    fn bad_number_is_a_data_source_error() {
        let file =
            create_temp_csv("time,open,high,low,close,volume\n2024-01-02,1,two,0.5,1.5,10\n");
        let result = CsvBarSource::new(file.path()).fetch_bars(NumBackend::Decimal);
        assert!(matches!(result, Err(EngineError::DataSource { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = CsvBarSource::new("/nonexistent/bars.csv").fetch_bars(NumBackend::Double);
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
