//! OHLCV bar representation and series-level checks.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::error::BacktestError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    fn check(&self, index: usize) -> Result<(), BacktestError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(BacktestError::MalformedBar {
                index,
                reason: "prices must be positive finite numbers".into(),
            });
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(BacktestError::MalformedBar {
                index,
                reason: format!("high {} below open/close/low", self.high),
            });
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(BacktestError::MalformedBar {
                index,
                reason: format!("low {} above open/close/high", self.low),
            });
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BacktestError::MalformedBar {
                index,
                reason: format!("volume {} must be non-negative", self.volume),
            });
        }
        Ok(())
    }
}

/// Reject series a run must never be launched on: empty, out of order,
/// duplicated timestamps, or bars violating the OHLC envelope.
pub fn validate_series(bars: &[Bar], symbol: &str) -> Result<(), BacktestError> {
    if bars.is_empty() {
        return Err(BacktestError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    for (i, bar) in bars.iter().enumerate() {
        bar.check(i)?;
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(BacktestError::NonMonotonicTimestamps { index: i });
        }
    }

    Ok(())
}

/// Aggregate intraday bars into one bar per UTC calendar day.
///
/// Input must already be sorted by timestamp. Each daily bar is stamped with
/// the timestamp of the first bar of that day.
pub fn resample_daily(bars: &[Bar]) -> Vec<Bar> {
    let mut daily: Vec<Bar> = Vec::new();
    let mut current_day: Option<NaiveDate> = None;

    for bar in bars {
        let day = bar.timestamp.date_naive();
        if current_day == Some(day) {
            if let Some(agg) = daily.last_mut() {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
        } else {
            current_day = Some(day);
            daily.push(bar.clone());
        }
    }

    daily
}

/// Descriptive statistics for a loaded series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub bars: usize,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
    pub first_close: f64,
    pub last_close: f64,
    pub price_change_pct: f64,
    pub highest: f64,
    pub lowest: f64,
    pub avg_volume: f64,
}

impl SeriesSummary {
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let first = bars.first()?;
        let last = bars.last()?;

        let highest = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let avg_volume = bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64;

        Some(SeriesSummary {
            bars: bars.len(),
            first_timestamp: first.timestamp,
            last_timestamp: last.timestamp,
            first_close: first.close,
            last_close: last.close,
            price_change_pct: (last.close / first.close - 1.0) * 100.0,
            highest,
            lowest,
            avg_volume,
        })
    }
}
