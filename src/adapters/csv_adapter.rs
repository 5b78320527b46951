//! CSV file market-data adapter.
//!
//! Reads `{data_dir}/{SYMBOL}_{INTERVAL}.csv` with the header
//! `timestamp,open,high,low,close,volume`.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol.to_uppercase(), interval))
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, or epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ts| ts.and_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<f64, BacktestError> {
    record
        .get(index)
        .ok_or_else(|| BacktestError::Data {
            reason: format!("row {}: missing {} column", row, name),
        })?
        .trim()
        .parse()
        .map_err(|e| BacktestError::Data {
            reason: format!("row {}: invalid {} value: {}", row, name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        interval: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, BacktestError> {
        let path = self.csv_path(symbol, interval);
        let content = fs::read_to_string(&path).map_err(|e| BacktestError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| BacktestError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_ts = record.get(0).ok_or_else(|| BacktestError::Data {
                reason: format!("row {}: missing timestamp column", row),
            })?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| BacktestError::Data {
                reason: format!("row {}: invalid timestamp '{}'", row, raw_ts),
            })?;

            if start.is_some_and(|s| timestamp < s) || end.is_some_and(|e| timestamp > e) {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: parse_field(&record, 1, "open", row)?,
                high: parse_field(&record, 2, "high", row)?,
                low: parse_field(&record, 3, "low", row)?,
                close: parse_field(&record, 4, "close", row)?,
                volume: parse_field(&record, 5, "volume", row)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_symbols(&self, interval: &str) -> Result<Vec<String>, BacktestError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BacktestError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", interval);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| BacktestError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
