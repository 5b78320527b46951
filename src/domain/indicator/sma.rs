//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) values are undefined.

use crate::domain::indicator::{mean, IndicatorSeries, IndicatorType};

pub fn calculate_sma(closes: &[f64], period: usize) -> IndicatorSeries {
    IndicatorSeries::new(IndicatorType::Sma(period), rolling_mean(closes, period))
}

/// Windowed arithmetic mean, undefined for index < period - 1.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                Some(mean(&values[i + 1 - period..=i]))
            }
        })
        .collect()
}
