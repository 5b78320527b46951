//! Strategy families and their per-bar predicates.
//!
//! A strategy only decides which predicates fire on a bar. Turning those
//! predicates into ledger transitions happens once, in
//! [`crate::domain::backtest::run_backtest`].
//!
//! # Predicate table
//!
//! | Strategy | Long entry | Long exit / short entry | Short exit |
//! |---|---|---|---|
//! | SMA crossover | fast crosses above slow | fast crosses below slow | fast crosses above slow |
//! | RSI mean reversion | RSI < oversold and flat | RSI > overbought | RSI < 50 |
//! | MACD momentum | MACD crosses above signal | MACD crosses below signal | MACD crosses above signal |
//! | Bollinger bands | close <= lower and flat | close >= upper | close <= middle |
//! | Dual momentum | close > fast > slow, RSI < 40, flat | close < fast < slow, RSI > 60 (short only if RSI > 70) | close > fast or RSI < 45 |

use std::fmt;

use crate::domain::error::BacktestError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_frame::IndicatorFrame;
use crate::domain::ohlcv::Bar;
use crate::domain::position::Side;

pub const RSI_PERIOD: usize = 14;
pub const RSI_NEUTRAL: f64 = 50.0;

const DUAL_LONG_RSI_MAX: f64 = 40.0;
const DUAL_EXIT_RSI_MIN: f64 = 60.0;
const DUAL_SHORT_RSI_MIN: f64 = 70.0;
const DUAL_COVER_RSI_MAX: f64 = 45.0;

/// Tunable inputs shared by the strategy families.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            fast_period: 20,
            slow_period: 50,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    SmaCrossover { fast_period: usize, slow_period: usize },
    RsiMeanReversion { oversold: f64, overbought: f64 },
    MacdMomentum,
    BollingerBands,
    DualMomentum { fast_period: usize, slow_period: usize },
}

/// Predicates that fired on one bar.
///
/// `open_short` gates the short entry that may follow a long exit; it is
/// true for every family except dual momentum, which only shorts on a
/// stronger RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signal {
    pub enter_long: bool,
    pub exit_long: bool,
    pub open_short: bool,
    pub exit_short: bool,
}

impl Signal {
    pub fn is_quiet(&self) -> bool {
        !self.enter_long && !self.exit_long && !self.exit_short
    }
}

pub const STRATEGY_NAMES: [&str; 5] = [
    "sma_crossover",
    "rsi_mean_reversion",
    "macd_momentum",
    "bollinger_bands",
    "dual_momentum",
];

impl Strategy {
    pub fn from_name(name: &str, params: &StrategyParams) -> Result<Strategy, BacktestError> {
        let strategy = match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sma_crossover" | "sma" => Strategy::SmaCrossover {
                fast_period: params.fast_period,
                slow_period: params.slow_period,
            },
            "rsi_mean_reversion" | "rsi" => Strategy::RsiMeanReversion {
                oversold: params.oversold,
                overbought: params.overbought,
            },
            "macd_momentum" | "macd" => Strategy::MacdMomentum,
            "bollinger_bands" | "bollinger" | "bb" => Strategy::BollingerBands,
            "dual_momentum" | "dual" => Strategy::DualMomentum {
                fast_period: params.fast_period,
                slow_period: params.slow_period,
            },
            _ => {
                return Err(BacktestError::UnknownStrategy {
                    name: name.to_string(),
                });
            }
        };
        Ok(strategy)
    }

    /// One instance of every family, in a fixed order.
    pub fn all(params: &StrategyParams) -> Vec<Strategy> {
        STRATEGY_NAMES
            .iter()
            .filter_map(|name| Strategy::from_name(name, params).ok())
            .collect()
    }

    /// Identifier accepted by [`Strategy::from_name`].
    pub fn id(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover { .. } => STRATEGY_NAMES[0],
            Strategy::RsiMeanReversion { .. } => STRATEGY_NAMES[1],
            Strategy::MacdMomentum => STRATEGY_NAMES[2],
            Strategy::BollingerBands => STRATEGY_NAMES[3],
            Strategy::DualMomentum { .. } => STRATEGY_NAMES[4],
        }
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match self {
            Strategy::SmaCrossover {
                fast_period,
                slow_period,
            } => vec![IndicatorType::Sma(*fast_period), IndicatorType::Sma(*slow_period)],
            Strategy::RsiMeanReversion { .. } => vec![IndicatorType::Rsi(RSI_PERIOD)],
            Strategy::MacdMomentum => vec![IndicatorType::MacdLine, IndicatorType::MacdSignal],
            Strategy::BollingerBands => vec![
                IndicatorType::BollingerUpper,
                IndicatorType::BollingerMiddle,
                IndicatorType::BollingerLower,
            ],
            Strategy::DualMomentum {
                fast_period,
                slow_period,
            } => vec![
                IndicatorType::Sma(*fast_period),
                IndicatorType::Sma(*slow_period),
                IndicatorType::Rsi(RSI_PERIOD),
            ],
        }
    }

    /// Crossover families compare against the previous bar.
    pub fn uses_previous_bar(&self) -> bool {
        matches!(self, Strategy::SmaCrossover { .. } | Strategy::MacdMomentum)
    }

    /// First bar index at which [`Strategy::evaluate`] can return a signal.
    pub fn start_index(&self, frame: &IndicatorFrame) -> Option<usize> {
        let mut start = 0;
        for indicator in self.required_indicators() {
            let first = frame.series(indicator)?.first_defined()?;
            start = start.max(first);
        }
        if self.uses_previous_bar() {
            start += 1;
        }
        (start < frame.len()).then_some(start)
    }

    /// Evaluate the predicates at bar `i` given the currently held side.
    ///
    /// Returns `None` when any indicator the predicates read is undefined at
    /// `i` (or at `i - 1` for crossover families); such bars are skipped.
    pub fn evaluate(
        &self,
        frame: &IndicatorFrame,
        bars: &[Bar],
        i: usize,
        held: Option<Side>,
    ) -> Option<Signal> {
        let close = bars.get(i)?.close;
        let flat = held.is_none();
        let short_held = held == Some(Side::Short);

        match self {
            Strategy::SmaCrossover {
                fast_period,
                slow_period,
            } => crossover_signal(
                frame,
                IndicatorType::Sma(*fast_period),
                IndicatorType::Sma(*slow_period),
                i,
            ),
            Strategy::MacdMomentum => {
                crossover_signal(frame, IndicatorType::MacdLine, IndicatorType::MacdSignal, i)
            }
            Strategy::RsiMeanReversion {
                oversold,
                overbought,
            } => {
                let rsi = frame.get(IndicatorType::Rsi(RSI_PERIOD), i)?;
                Some(Signal {
                    enter_long: rsi < *oversold && flat,
                    exit_long: rsi > *overbought,
                    open_short: true,
                    exit_short: short_held && rsi < RSI_NEUTRAL,
                })
            }
            Strategy::BollingerBands => {
                let upper = frame.get(IndicatorType::BollingerUpper, i)?;
                let middle = frame.get(IndicatorType::BollingerMiddle, i)?;
                let lower = frame.get(IndicatorType::BollingerLower, i)?;
                Some(Signal {
                    enter_long: close <= lower && flat,
                    exit_long: close >= upper,
                    open_short: true,
                    exit_short: short_held && close <= middle,
                })
            }
            Strategy::DualMomentum {
                fast_period,
                slow_period,
            } => {
                let fast = frame.get(IndicatorType::Sma(*fast_period), i)?;
                let slow = frame.get(IndicatorType::Sma(*slow_period), i)?;
                let rsi = frame.get(IndicatorType::Rsi(RSI_PERIOD), i)?;
                Some(Signal {
                    enter_long: close > fast && fast > slow && rsi < DUAL_LONG_RSI_MAX && flat,
                    exit_long: close < fast && fast < slow && rsi > DUAL_EXIT_RSI_MIN,
                    open_short: rsi > DUAL_SHORT_RSI_MIN,
                    exit_short: short_held && (close > fast || rsi < DUAL_COVER_RSI_MAX),
                })
            }
        }
    }
}

/// Bullish crossover: previous a <= b, now a > b. Bearish is the mirror.
fn crossover_signal(
    frame: &IndicatorFrame,
    a: IndicatorType,
    b: IndicatorType,
    i: usize,
) -> Option<Signal> {
    let prev = i.checked_sub(1)?;
    let a_curr = frame.get(a, i)?;
    let b_curr = frame.get(b, i)?;
    let a_prev = frame.get(a, prev)?;
    let b_prev = frame.get(b, prev)?;

    let bullish = a_prev <= b_prev && a_curr > b_curr;
    let bearish = a_prev >= b_prev && a_curr < b_curr;

    Some(Signal {
        enter_long: bullish,
        exit_long: bearish,
        open_short: true,
        exit_short: bullish,
    })
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SmaCrossover {
                fast_period,
                slow_period,
            } => write!(f, "SMA Crossover ({}/{})", fast_period, slow_period),
            Strategy::RsiMeanReversion {
                oversold,
                overbought,
            } => write!(f, "RSI Mean Reversion ({}/{})", oversold, overbought),
            Strategy::MacdMomentum => write!(f, "MACD Momentum"),
            Strategy::BollingerBands => write!(f, "Bollinger Bands"),
            Strategy::DualMomentum {
                fast_period,
                slow_period,
            } => write!(f, "Dual Momentum ({}/{})", fast_period, slow_period),
        }
    }
}
