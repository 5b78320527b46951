//! Plain-text reports printed to stdout.
//!
//! - Performance report for a single run
//! - Strategy comparison table (several strategies, one series)
//! - Asset comparison table (one strategy, several symbols)

use crate::domain::backtest::BacktestResult;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::Strategy;

const RULE_WIDTH: usize = 60;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

pub fn render_performance_report(metrics: &Metrics, strategy: &Strategy, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", rule('=')));
    output.push_str(&format!("BACKTEST RESULTS: {} on {}\n", strategy, symbol));
    output.push_str(&format!("{}\n", rule('=')));

    output.push_str("\nCapital & Returns\n");
    output.push_str(&format!("  Initial Capital:  ${:.2}\n", metrics.initial_capital));
    output.push_str(&format!("  Final Capital:    ${:.2}\n", metrics.final_capital));
    output.push_str(&format!("  Total P&L:        ${:.2}\n", metrics.total_pnl));
    output.push_str(&format!("  Total Return:     {:.2}%\n", metrics.total_return));

    output.push_str("\nTrade Statistics\n");
    output.push_str(&format!("  Total Trades:     {}\n", metrics.total_trades));
    output.push_str(&format!(
        "  Long / Short:     {} / {}\n",
        metrics.long_trades, metrics.short_trades
    ));
    output.push_str(&format!("  Winning Trades:   {}\n", metrics.winning_trades));
    output.push_str(&format!("  Losing Trades:    {}\n", metrics.losing_trades));
    output.push_str(&format!("  Win Rate:         {:.1}%\n", metrics.win_rate));

    output.push_str("\nProfit Metrics\n");
    output.push_str(&format!("  Profit Factor:    {:.2}\n", metrics.profit_factor));
    output.push_str(&format!("  Avg Trade:        ${:.2}\n", metrics.avg_trade));
    output.push_str(&format!("  Avg Win:          ${:.2}\n", metrics.avg_win));
    output.push_str(&format!("  Avg Loss:         ${:.2}\n", metrics.avg_loss));
    output.push_str(&format!("  Total Commission: ${:.2}\n", metrics.total_commission));

    output.push_str("\nRisk Metrics\n");
    output.push_str(&format!("  Max Drawdown:     {:.2}%\n", metrics.max_drawdown));
    output.push_str(&format!("  Sharpe Ratio:     {:.2}\n", metrics.sharpe_ratio));

    output.push_str(&format!("{}\n", rule('=')));
    output
}

/// First item with the largest key; ties keep the earliest entry.
fn best_by<'a, T>(items: &'a [T], key: impl Fn(&T) -> f64) -> Option<&'a T> {
    items.iter().rev().max_by(|a, b| key(a).total_cmp(&key(b)))
}

fn worst_by<'a, T>(items: &'a [T], key: impl Fn(&T) -> f64) -> Option<&'a T> {
    items.iter().min_by(|a, b| key(a).total_cmp(&key(b)))
}

pub fn render_strategy_comparison(results: &[BacktestResult], symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("STRATEGY COMPARISON: {}\n", symbol));
    output.push_str(&format!("{}\n", rule('=')));
    output.push_str(&format!(
        "{:<28} {:>9} {:>7} {:>9} {:>7}\n",
        "Strategy", "Return", "Trades", "Win Rate", "Sharpe"
    ));
    output.push_str(&format!("{}\n", rule('-')));

    for result in results {
        let m = &result.metrics;
        output.push_str(&format!(
            "{:<28} {:>8.2}% {:>7} {:>8.1}% {:>7.2}\n",
            result.strategy.to_string(),
            m.total_return,
            m.total_trades,
            m.win_rate,
            m.sharpe_ratio
        ));
    }

    output.push_str(&format!("{}\n", rule('=')));
    if let Some(best) = best_by(results, |r| r.metrics.total_return) {
        output.push_str(&format!(
            "Best Strategy: {} ({:.2}%)\n",
            best.strategy, best.metrics.total_return
        ));
    }
    output
}

pub fn render_asset_comparison(results: &[(String, BacktestResult)], strategy: &Strategy) -> String {
    let mut output = String::new();

    output.push_str(&format!("ASSET COMPARISON: {}\n", strategy));
    output.push_str(&format!("{}\n", rule('=')));
    output.push_str(&format!(
        "{:<10} {:>9} {:>7} {:>9} {:>7} {:>9}\n",
        "Symbol", "Return", "Trades", "Win Rate", "Sharpe", "Max DD"
    ));
    output.push_str(&format!("{}\n", rule('-')));

    for (symbol, result) in results {
        let m = &result.metrics;
        output.push_str(&format!(
            "{:<10} {:>8.2}% {:>7} {:>8.1}% {:>7.2} {:>8.2}%\n",
            symbol, m.total_return, m.total_trades, m.win_rate, m.sharpe_ratio, m.max_drawdown
        ));
    }

    output.push_str(&format!("{}\n", rule('=')));
    if let Some((symbol, best)) = best_by(results, |(_, r)| r.metrics.total_return) {
        output.push_str(&format!(
            "Best Performer:      {} ({:.2}%)\n",
            symbol, best.metrics.total_return
        ));
    }
    if let Some((symbol, worst)) = worst_by(results, |(_, r)| r.metrics.total_return) {
        output.push_str(&format!(
            "Worst Performer:     {} ({:.2}%)\n",
            symbol, worst.metrics.total_return
        ));
    }
    if let Some((symbol, best)) = best_by(results, |(_, r)| r.metrics.sharpe_ratio) {
        output.push_str(&format!(
            "Best Risk-Adjusted:  {} (Sharpe {:.2})\n",
            symbol, best.metrics.sharpe_ratio
        ));
    }
    output
}
