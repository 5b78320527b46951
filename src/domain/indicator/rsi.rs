//! RSI (Relative Strength Index).
//!
//! Simple rolling means over the last n close-to-close changes:
//! - avg_gain = mean(max(Δ, 0)), avg_loss = mean(max(-Δ, 0))
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! - avg_loss == 0 and avg_gain > 0: RSI = 100
//! - avg_loss == 0 and avg_gain == 0 (flat prices): RSI = 50
//!
//! Warmup: first n bars are undefined (need n price changes).

use crate::domain::indicator::{mean, IndicatorSeries, IndicatorType};

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut values = vec![None; closes.len()];

    if period == 0 || closes.len() <= period {
        return IndicatorSeries::new(IndicatorType::Rsi(period), values);
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    // gains[k] holds the change into bar k + 1
    for (i, slot) in values.iter_mut().enumerate().skip(period) {
        let start = i - period;
        let avg_gain = mean(&gains[start..i]);
        let avg_loss = mean(&losses[start..i]);
        *slot = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    IndicatorSeries::new(IndicatorType::Rsi(period), values)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
