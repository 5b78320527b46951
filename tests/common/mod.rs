#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use cryptobacktest::domain::backtest::BacktestConfig;
use cryptobacktest::domain::error::BacktestError;
use cryptobacktest::domain::indicator::IndicatorType;
use cryptobacktest::domain::indicator_frame::IndicatorFrame;
pub use cryptobacktest::domain::ohlcv::Bar;
use cryptobacktest::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        _interval: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| start.is_none_or(|s| b.timestamp >= s))
            .filter(|b| end.is_none_or(|e| b.timestamp <= e))
            .collect())
    }

    fn list_symbols(&self, _interval: &str) -> Result<Vec<String>, BacktestError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

/// Daily bars where every price equals the close.
pub fn flat_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: day(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Daily bars with a 1% envelope around each close.
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: day(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Oscillating close series long enough for every indicator to warm up.
pub fn wave_closes(count: usize, base: f64, amplitude: f64, step: f64) -> Vec<f64> {
    (0..count)
        .map(|i| base + (i as f64 * step).sin() * amplitude + i as f64 * 0.05)
        .collect()
}

pub fn sma_frame(fast: &[f64], slow: &[f64]) -> IndicatorFrame {
    IndicatorFrame::from_columns(
        fast.len(),
        vec![
            (IndicatorType::Sma(20), fast.iter().copied().map(Some).collect()),
            (IndicatorType::Sma(50), slow.iter().copied().map(Some).collect()),
        ],
    )
}

pub fn rsi_frame(values: &[Option<f64>]) -> IndicatorFrame {
    IndicatorFrame::from_columns(values.len(), vec![(IndicatorType::Rsi(14), values.to_vec())])
}

/// Frame for dual momentum with fast/slow SMA(20)/SMA(50) and RSI(14).
pub fn dual_frame(fast: &[f64], slow: &[f64], rsi: &[f64]) -> IndicatorFrame {
    IndicatorFrame::from_columns(
        fast.len(),
        vec![
            (IndicatorType::Sma(20), fast.iter().copied().map(Some).collect()),
            (IndicatorType::Sma(50), slow.iter().copied().map(Some).collect()),
            (IndicatorType::Rsi(14), rsi.iter().copied().map(Some).collect()),
        ],
    )
}

pub fn bollinger_frame(upper: &[f64], middle: &[f64], lower: &[f64]) -> IndicatorFrame {
    IndicatorFrame::from_columns(
        upper.len(),
        vec![
            (IndicatorType::BollingerUpper, upper.iter().copied().map(Some).collect()),
            (IndicatorType::BollingerMiddle, middle.iter().copied().map(Some).collect()),
            (IndicatorType::BollingerLower, lower.iter().copied().map(Some).collect()),
        ],
    )
}

pub fn zero_commission() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 10_000.0,
        commission_rate: 0.0,
        allow_short: true,
    }
}
