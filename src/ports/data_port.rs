//! Market-data port trait.

use chrono::{DateTime, Utc};

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;

/// Supplies bars for a (symbol, interval, time range) request.
///
/// Implementations return bars sorted by ascending timestamp, restricted to
/// the inclusive `[start, end]` range when bounds are given. A provider with
/// no matching rows returns an empty vector, never partial bars.
pub trait DataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        interval: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, BacktestError>;

    fn list_symbols(&self, interval: &str) -> Result<Vec<String>, BacktestError>;

    /// First and last timestamp plus bar count, or `None` when no bars exist.
    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, BacktestError> {
        let bars = self.fetch_bars(symbol, interval, None, None)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
