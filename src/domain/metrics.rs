//! Performance metrics computed from the closed-position history.
//!
//! Percentages (total return, win rate, drawdown) are expressed in percent,
//! not as fractions.

use crate::domain::position::Position;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Denominator used for profit factor when no trade lost money.
pub const PROFIT_FACTOR_LOSS_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_pnl: f64,
    pub total_return: f64,
    pub total_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_trade: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub total_commission: f64,
}

impl Metrics {
    /// Record for a run that never closed a position.
    pub fn empty(initial_capital: f64) -> Self {
        Metrics {
            initial_capital,
            final_capital: initial_capital,
            total_pnl: 0.0,
            total_return: 0.0,
            total_trades: 0,
            long_trades: 0,
            short_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
            avg_trade: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            total_commission: 0.0,
        }
    }

    /// Reduce closed positions (in close order) to a metrics record.
    /// Positions that are still open are ignored.
    pub fn compute(positions: &[Position], commission_rate: f64, initial_capital: f64) -> Self {
        let closed: Vec<(&Position, f64)> = positions
            .iter()
            .filter_map(|p| p.realized_pnl(commission_rate).map(|pnl| (p, pnl)))
            .collect();

        if closed.is_empty() {
            return Metrics::empty(initial_capital);
        }

        let pnls: Vec<f64> = closed.iter().map(|(_, pnl)| *pnl).collect();
        let total_trades = pnls.len();
        let total_pnl: f64 = pnls.iter().sum();

        let total_return = if initial_capital > 0.0 {
            total_pnl / initial_capital * 100.0
        } else {
            0.0
        };

        let long_trades = closed.iter().filter(|(p, _)| p.is_long()).count();
        let short_trades = total_trades - long_trades;

        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p <= 0.0).collect();

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum::<f64>().abs();
        // Break-even losers leave gross_loss at zero and yield 0, not the floor.
        let profit_factor = if losses.is_empty() {
            gross_profit / PROFIT_FACTOR_LOSS_FLOOR
        } else if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else {
            0.0
        };

        let total_commission: f64 = closed
            .iter()
            .map(|(p, _)| {
                p.exit_price
                    .map(|exit| p.round_trip_commission(exit, commission_rate))
                    .unwrap_or(0.0)
            })
            .sum();

        Metrics {
            initial_capital,
            final_capital: initial_capital + total_pnl,
            total_pnl,
            total_return,
            total_trades,
            long_trades,
            short_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: wins.len() as f64 / total_trades as f64 * 100.0,
            profit_factor,
            avg_trade: total_pnl / total_trades as f64,
            avg_win: average(&wins),
            avg_loss: average(&losses),
            max_drawdown: compute_drawdown(initial_capital, &pnls),
            sharpe_ratio: compute_sharpe(initial_capital, &pnls),
            total_commission,
        }
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Largest peak-to-trough decline, in percent, of the capital curve
/// `[initial, initial + pnl[0], initial + pnl[0] + pnl[1], ...]`.
fn compute_drawdown(initial_capital: f64, pnls: &[f64]) -> f64 {
    let mut capital = initial_capital;
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;

    for pnl in pnls {
        capital += pnl;
        if capital > peak {
            peak = capital;
        } else if peak > 0.0 {
            let dd = (peak - capital) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// mean / population stddev of per-trade returns (P&L over initial capital),
/// annualized by sqrt(252). Zero for fewer than two trades or zero variance.
fn compute_sharpe(initial_capital: f64, pnls: &[f64]) -> f64 {
    if pnls.len() < 2 || initial_capital <= 0.0 {
        return 0.0;
    }

    let returns: Vec<f64> = pnls.iter().map(|p| p / initial_capital).collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
