//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! The recurrences run from the first bar, but all three lines are reported
//! undefined for the first (slow + signal - 1) bars while they warm up.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

/// Number of leading bars reported as undefined.
pub fn warmup(slow: usize, signal: usize) -> usize {
    (slow + signal).saturating_sub(1)
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
    let n = closes.len();
    if fast == 0 || slow == 0 || signal == 0 {
        return MacdLines {
            line: IndicatorSeries::new(IndicatorType::MacdLine, vec![None; n]),
            signal: IndicatorSeries::new(IndicatorType::MacdSignal, vec![None; n]),
            histogram: IndicatorSeries::new(IndicatorType::MacdHistogram, vec![None; n]),
        };
    }

    let ema_fast = ema_values(closes, fast);
    let ema_slow = ema_values(closes, slow);

    let raw_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f.unwrap_or(0.0) - s.unwrap_or(0.0))
        .collect();
    let raw_signal = ema_values(&raw_line, signal);

    let warmup = warmup(slow, signal);
    let mut line = Vec::with_capacity(n);
    let mut sig = Vec::with_capacity(n);
    let mut hist = Vec::with_capacity(n);

    for i in 0..n {
        if i < warmup {
            line.push(None);
            sig.push(None);
            hist.push(None);
        } else {
            let l = raw_line[i];
            let s = raw_signal[i].unwrap_or(0.0);
            line.push(Some(l));
            sig.push(Some(s));
            hist.push(Some(l - s));
        }
    }

    MacdLines {
        line: IndicatorSeries::new(IndicatorType::MacdLine, line),
        signal: IndicatorSeries::new(IndicatorType::MacdSignal, sig),
        histogram: IndicatorSeries::new(IndicatorType::MacdHistogram, hist),
    }
}
