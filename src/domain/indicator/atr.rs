//! Average True Range.
//!
//! ATR(n)[i] = mean(TR[i-n+1..=i]) where TR[0] = high - low and
//! TR[i] = max(high - low, |high - prevClose|, |low - prevClose|).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    let true_ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    IndicatorSeries::new(IndicatorType::Atr(period), rolling_mean(&true_ranges, period))
}
