//! Indicator frame: every indicator column for one bar series.
//!
//! The frame is derived once per series and is read-only afterwards, so a
//! single frame can be shared across concurrent strategy runs.

use std::collections::HashMap;

use crate::domain::indicator::{
    calculate_atr, calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi,
    calculate_sma, macd, IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::Bar;

/// Parameters for the columns computed by [`compute_indicators`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSettings {
    pub sma_windows: Vec<usize>,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub atr_period: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            sma_windows: vec![20, 50, 200],
            ema_fast: macd::DEFAULT_FAST,
            ema_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            atr_period: 14,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    len: usize,
    columns: HashMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorFrame {
    pub fn new(len: usize) -> Self {
        IndicatorFrame {
            len,
            columns: HashMap::new(),
        }
    }

    /// Add or replace a column. Columns shorter than the frame read as
    /// undefined past their end; longer ones are truncated.
    pub fn insert(&mut self, mut series: IndicatorSeries) {
        series.values.resize(self.len, None);
        self.columns.insert(series.indicator_type, series);
    }

    /// Build a frame from raw column values. Used for hand-built fixtures.
    pub fn from_columns(len: usize, columns: Vec<(IndicatorType, Vec<Option<f64>>)>) -> Self {
        let mut frame = IndicatorFrame::new(len);
        for (indicator_type, values) in columns {
            frame.insert(IndicatorSeries::new(indicator_type, values));
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, indicator: IndicatorType) -> bool {
        self.columns.contains_key(&indicator)
    }

    pub fn series(&self, indicator: IndicatorType) -> Option<&IndicatorSeries> {
        self.columns.get(&indicator)
    }

    /// Value of `indicator` at `index`; `None` when the column is absent,
    /// the index is out of range, or the value is still warming up.
    pub fn get(&self, indicator: IndicatorType, index: usize) -> Option<f64> {
        self.columns.get(&indicator).and_then(|s| s.get(index))
    }

    /// Column identities in a stable order.
    pub fn indicators(&self) -> Vec<IndicatorType> {
        let mut keys: Vec<IndicatorType> = self.columns.keys().copied().collect();
        keys.sort();
        keys
    }
}

pub fn compute_indicators(bars: &[Bar], settings: &IndicatorSettings) -> IndicatorFrame {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let mut frame = IndicatorFrame::new(bars.len());

    for &window in &settings.sma_windows {
        frame.insert(calculate_sma(&closes, window));
    }
    frame.insert(calculate_ema(&closes, settings.ema_fast));
    frame.insert(calculate_ema(&closes, settings.ema_slow));

    let macd = calculate_macd(
        &closes,
        settings.ema_fast,
        settings.ema_slow,
        settings.macd_signal,
    );
    frame.insert(macd.line);
    frame.insert(macd.signal);
    frame.insert(macd.histogram);

    frame.insert(calculate_rsi(&closes, settings.rsi_period));

    let bands = calculate_bollinger(
        &closes,
        settings.bollinger_period,
        settings.bollinger_multiplier,
    );
    frame.insert(bands.upper);
    frame.insert(bands.middle);
    frame.insert(bands.lower);

    frame.insert(calculate_atr(bars, settings.atr_period));

    frame
}
