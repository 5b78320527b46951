//! Technical indicator implementations.
//!
//! Every indicator produces one value per input bar, index-aligned with the
//! input. A value is `None` until the indicator's lookback is satisfied; that
//! state propagates as missing and is never coerced to zero.
//!
//! - `IndicatorType`: identity + parameters of one scalar column (serves as HashMap key)
//! - `IndicatorSeries`: a column of optional values tagged with its type

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdLines};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    MacdLine,
    MacdSignal,
    MacdHistogram,
    Rsi(usize),
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    Atr(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, values: Vec<Option<f64>>) -> Self {
        Self {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, or `None` when undefined or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Index of the first defined value.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::MacdLine => write!(f, "MACD"),
            IndicatorType::MacdSignal => write!(f, "MACD_SIGNAL"),
            IndicatorType::MacdHistogram => write!(f, "MACD_HIST"),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::BollingerUpper => write!(f, "BB_UPPER"),
            IndicatorType::BollingerMiddle => write!(f, "BB_MIDDLE"),
            IndicatorType::BollingerLower => write!(f, "BB_LOWER"),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
        }
    }
}

/// Arithmetic mean of a non-empty window.
pub(crate) fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}
