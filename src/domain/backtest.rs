//! Backtest driver: one state machine shared by every strategy family.
//!
//! Each bar the strategy reports which predicates fired; the driver turns
//! them into at most one close followed by at most one open on the ledger.
//! Any position still open after the last bar is closed at its close price.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::error::BacktestError;
use crate::domain::indicator_frame::IndicatorFrame;
use crate::domain::ledger::PositionLedger;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::{validate_series, Bar};
use crate::domain::position::{Position, Side};
use crate::domain::strategy::{Signal, Strategy};
use crate::domain::trade::Trade;

/// Fraction of simulated capital committed to each new position.
pub const SIZING_FRACTION: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub allow_short: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            commission_rate: 0.001,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub positions: Vec<Position>,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
}

/// Simulate `strategy` over `bars` using the precomputed `frame`.
///
/// Fails before the first bar when the series is unusable or the frame lacks
/// an indicator the strategy reads. A ledger error mid-run aborts the run.
pub fn run_backtest(
    bars: &[Bar],
    frame: &IndicatorFrame,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    validate_series(bars, &strategy.to_string())?;
    if frame.len() != bars.len() {
        return Err(BacktestError::Data {
            reason: format!(
                "indicator frame has {} rows for {} bars",
                frame.len(),
                bars.len()
            ),
        });
    }
    for indicator in strategy.required_indicators() {
        if !frame.contains(indicator) {
            return Err(BacktestError::MissingIndicator {
                indicator: indicator.to_string(),
            });
        }
    }

    info!(strategy = %strategy, bars = bars.len(), "starting backtest");

    let mut ledger = PositionLedger::new(config.initial_capital, config.commission_rate);

    match strategy.start_index(frame) {
        Some(start) => {
            debug!(start, "first evaluable bar");
            for i in start..bars.len() {
                let Some(signal) = strategy.evaluate(frame, bars, i, ledger.current_side()) else {
                    continue;
                };
                apply_signal(&mut ledger, signal, &bars[i], i, config)?;
            }
        }
        None => {
            debug!("indicators never defined over the series, no bars evaluated");
        }
    }

    if let Some(last) = bars.last() {
        ledger.force_close(bars.len() - 1, last.timestamp, last.close)?;
    }

    let (positions, trades) = ledger.into_parts();
    let metrics = Metrics::compute(&positions, config.commission_rate, config.initial_capital);

    info!(
        strategy = %strategy,
        trades = metrics.total_trades,
        total_return = metrics.total_return,
        "backtest finished"
    );

    Ok(BacktestResult {
        strategy: strategy.clone(),
        positions,
        trades,
        metrics,
    })
}

fn apply_signal(
    ledger: &mut PositionLedger,
    signal: Signal,
    bar: &Bar,
    index: usize,
    config: &BacktestConfig,
) -> Result<(), BacktestError> {
    if signal.is_quiet() {
        return Ok(());
    }
    let held = ledger.current_side();

    if signal.enter_long {
        if held == Some(Side::Short) {
            ledger.close(index, bar.timestamp, bar.close)?;
        }
        if ledger.is_flat() {
            open_sized(ledger, Side::Long, bar, index)?;
        }
    } else if signal.exit_long {
        if held == Some(Side::Long) {
            ledger.close(index, bar.timestamp, bar.close)?;
        }
        if ledger.is_flat() && config.allow_short && signal.open_short {
            open_sized(ledger, Side::Short, bar, index)?;
        }
    } else if signal.exit_short && held == Some(Side::Short) {
        ledger.close(index, bar.timestamp, bar.close)?;
    }

    Ok(())
}

fn open_sized(
    ledger: &mut PositionLedger,
    side: Side,
    bar: &Bar,
    index: usize,
) -> Result<(), BacktestError> {
    let capital = ledger.capital();
    if capital <= 0.0 {
        warn!(index, capital, %side, "simulated capital exhausted, skipping entry");
        return Ok(());
    }
    let size = capital * SIZING_FRACTION / bar.close;
    ledger.open(side, index, bar.timestamp, bar.close, size)?;
    Ok(())
}

/// Run several strategies against one series and its shared frame in
/// parallel. Results keep the order of `strategies`.
pub fn run_many(
    bars: &[Bar],
    frame: &IndicatorFrame,
    strategies: &[Strategy],
    config: &BacktestConfig,
) -> Vec<Result<BacktestResult, BacktestError>> {
    strategies
        .par_iter()
        .map(|strategy| run_backtest(bars, frame, strategy, config))
        .collect()
}
