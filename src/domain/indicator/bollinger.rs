//! Bollinger Bands.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1)
//! over the same window as the middle band.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::stddev::rolling_stddev;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let middle = rolling_mean(closes, period);
    let stddev = rolling_stddev(closes, period);

    let (upper, lower): (Vec<Option<f64>>, Vec<Option<f64>>) = middle
        .iter()
        .zip(&stddev)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => (Some(m + multiplier * s), Some(m - multiplier * s)),
            _ => (None, None),
        })
        .unzip();

    BollingerBands {
        upper: IndicatorSeries::new(IndicatorType::BollingerUpper, upper),
        middle: IndicatorSeries::new(IndicatorType::BollingerMiddle, middle),
        lower: IndicatorSeries::new(IndicatorType::BollingerLower, lower),
    }
}
