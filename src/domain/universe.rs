//! Symbol universes for asset comparison.
//!
//! Parses symbol lists from configuration and loads each symbol's series,
//! skipping symbols whose data is missing or unusable.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{resample_daily, validate_series, Bar};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Request shared by every symbol of a universe.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub interval: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub resample_daily: bool,
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub series: Vec<(String, Vec<Bar>)>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Fetch, optionally resample, and validate one symbol's series.
pub fn load_series(
    data_port: &dyn DataPort,
    symbol: &str,
    request: &SeriesRequest,
) -> Result<Vec<Bar>, BacktestError> {
    let mut bars = data_port.fetch_bars(symbol, &request.interval, request.start, request.end)?;
    if request.resample_daily {
        bars = resample_daily(&bars);
    }
    validate_series(&bars, symbol)?;
    Ok(bars)
}

/// Load every symbol, skipping (with a warning) those that fail. Errors only
/// when no symbol yields a usable series.
pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
    request: &SeriesRequest,
) -> Result<LoadedUniverse, BacktestError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        match load_series(data_port, symbol, request) {
            Ok(bars) => {
                info!(symbol = %symbol, bars = bars.len(), "loaded series");
                series.push((symbol.clone(), bars));
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if series.is_empty() {
        return Err(BacktestError::Data {
            reason: format!("none of {} symbols has usable data", symbols.len()),
        });
    }

    Ok(LoadedUniverse { series, skipped })
}
