//! End-to-end tests of the backtest pipeline.
//!
//! Tests cover:
//! - Scenario runs on hand-built indicator frames (crossover, RSI reversal,
//!   dual momentum short gating, band and RSI exits of a held short)
//! - Degenerate series (flat prices, too short for any indicator)
//! - Forced close of a position still open at the last bar
//! - Loading through a mock data port, including skipped symbols
//! - Property tests for the ledger invariants and metrics purity

mod common;

use approx::assert_relative_eq;
use common::*;
use cryptobacktest::domain::backtest::{run_backtest, run_many, BacktestConfig};
use cryptobacktest::domain::error::BacktestError;
use cryptobacktest::domain::indicator_frame::{compute_indicators, IndicatorSettings};
use cryptobacktest::domain::metrics::Metrics;
use cryptobacktest::domain::position::Side;
use cryptobacktest::domain::strategy::{Strategy, StrategyParams};
use cryptobacktest::domain::trade::{Trade, TradeAction};
use cryptobacktest::domain::universe::{load_series, load_universe, SeriesRequest};
use proptest::prelude::*;
use proptest::strategy::Strategy as PropStrategy;

fn sma_strategy() -> Strategy {
    Strategy::SmaCrossover {
        fast_period: 20,
        slow_period: 50,
    }
}

fn rsi_strategy() -> Strategy {
    Strategy::RsiMeanReversion {
        oversold: 30.0,
        overbought: 70.0,
    }
}

fn dual_strategy() -> Strategy {
    Strategy::DualMomentum {
        fast_period: 20,
        slow_period: 50,
    }
}

fn actions(trades: &[Trade]) -> Vec<(usize, TradeAction)> {
    trades.iter().map(|t| (t.index, t.action)).collect()
}

fn daily_request() -> SeriesRequest {
    SeriesRequest {
        interval: "1d".into(),
        start: None,
        end: None,
        resample_daily: false,
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn sma_crossover_buys_at_crossing_bar() {
        let bars = flat_bars(&[100.0, 102.0, 104.0]);
        let frame = sma_frame(&[99.0, 99.0, 101.0], &[100.0, 100.0, 100.0]);

        let result = run_backtest(&bars, &frame, &sma_strategy(), &zero_commission()).unwrap();

        let buys: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .collect();
        assert_eq!(buys.len(), 1);
        assert_eq!(buys[0].index, 2);
        assert_eq!(buys[0].price, 104.0);
    }

    #[test]
    fn rsi_reversal_closes_long_and_opens_short_on_same_bar() {
        let bars = flat_bars(&[100.0, 90.0, 95.0, 110.0, 108.0]);
        let frame = rsi_frame(&[None, Some(25.0), Some(50.0), Some(75.0), Some(75.0)]);

        let result = run_backtest(&bars, &frame, &rsi_strategy(), &zero_commission()).unwrap();

        let actions: Vec<(usize, TradeAction)> =
            result.trades.iter().map(|t| (t.index, t.action)).collect();
        assert_eq!(
            actions,
            vec![
                (1, TradeAction::Buy),
                (3, TradeAction::Sell),
                (3, TradeAction::Short),
                (4, TradeAction::Cover),
            ]
        );
        assert_eq!(result.positions[0].side, Side::Long);
        assert_eq!(result.positions[1].side, Side::Short);
    }

    #[test]
    fn rsi_reversal_without_shorting_only_flattens() {
        let bars = flat_bars(&[100.0, 90.0, 95.0, 110.0, 108.0]);
        let frame = rsi_frame(&[None, Some(25.0), Some(50.0), Some(75.0), Some(75.0)]);
        let config = BacktestConfig {
            allow_short: false,
            ..zero_commission()
        };

        let result = run_backtest(&bars, &frame, &rsi_strategy(), &config).unwrap();

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[1].action, TradeAction::Sell);
        assert_eq!(result.trades[1].index, 3);
    }

    #[test]
    fn dual_momentum_moderate_rsi_exits_without_shorting() {
        let bars = flat_bars(&[110.0, 90.0, 92.0]);
        let frame = dual_frame(&[105.0, 95.0, 95.0], &[100.0; 3], &[35.0, 65.0, 65.0]);

        let result = run_backtest(&bars, &frame, &dual_strategy(), &zero_commission()).unwrap();

        assert_eq!(
            actions(&result.trades),
            vec![(0, TradeAction::Buy), (1, TradeAction::Sell)]
        );
        assert!(result.positions.iter().all(|p| p.side == Side::Long));
    }

    #[test]
    fn dual_momentum_strong_rsi_flips_to_short() {
        let bars = flat_bars(&[110.0, 90.0, 96.0]);
        let frame = dual_frame(&[105.0, 95.0, 95.0], &[100.0; 3], &[35.0, 75.0, 65.0]);

        let result = run_backtest(&bars, &frame, &dual_strategy(), &zero_commission()).unwrap();

        assert_eq!(
            actions(&result.trades),
            vec![
                (0, TradeAction::Buy),
                (1, TradeAction::Sell),
                (1, TradeAction::Short),
                (2, TradeAction::Cover),
            ]
        );
    }

    #[test]
    fn dual_momentum_strong_rsi_without_shorting_only_flattens() {
        let bars = flat_bars(&[110.0, 90.0, 96.0]);
        let frame = dual_frame(&[105.0, 95.0, 95.0], &[100.0; 3], &[35.0, 75.0, 65.0]);
        let config = BacktestConfig {
            allow_short: false,
            ..zero_commission()
        };

        let result = run_backtest(&bars, &frame, &dual_strategy(), &config).unwrap();

        assert_eq!(
            actions(&result.trades),
            vec![(0, TradeAction::Buy), (1, TradeAction::Sell)]
        );
    }

    #[test]
    fn rsi_oversold_covers_short_before_buying() {
        let bars = flat_bars(&[110.0, 90.0, 88.0, 92.0]);
        let frame = rsi_frame(&[Some(75.0), Some(25.0), Some(25.0), Some(50.0)]);

        let result = run_backtest(&bars, &frame, &rsi_strategy(), &zero_commission()).unwrap();

        // The oversold bar that covers the short never opens the long as well.
        assert_eq!(
            actions(&result.trades),
            vec![
                (0, TradeAction::Short),
                (1, TradeAction::Cover),
                (2, TradeAction::Buy),
                (3, TradeAction::Sell),
            ]
        );
    }

    #[test]
    fn rsi_short_held_above_neutral() {
        let bars = flat_bars(&[110.0, 105.0, 100.0]);
        let frame = rsi_frame(&[Some(75.0), Some(60.0), Some(55.0)]);

        let result = run_backtest(&bars, &frame, &rsi_strategy(), &zero_commission()).unwrap();

        assert_eq!(
            actions(&result.trades),
            vec![(0, TradeAction::Short), (2, TradeAction::Cover)]
        );
    }

    #[test]
    fn bollinger_lower_band_covers_short_before_buying() {
        let bars = flat_bars(&[110.0, 90.0, 90.0, 100.0]);
        let frame = bollinger_frame(&[105.0; 4], &[100.0; 4], &[95.0; 4]);

        let result =
            run_backtest(&bars, &frame, &Strategy::BollingerBands, &zero_commission()).unwrap();

        assert_eq!(
            actions(&result.trades),
            vec![
                (0, TradeAction::Short),
                (1, TradeAction::Cover),
                (2, TradeAction::Buy),
                (3, TradeAction::Sell),
            ]
        );
    }

    #[test]
    fn bollinger_short_held_above_middle() {
        let bars = flat_bars(&[110.0, 104.0, 101.0]);
        let frame = bollinger_frame(&[105.0; 3], &[100.0; 3], &[95.0; 3]);

        let result =
            run_backtest(&bars, &frame, &Strategy::BollingerBands, &zero_commission()).unwrap();

        assert_eq!(
            actions(&result.trades),
            vec![(0, TradeAction::Short), (2, TradeAction::Cover)]
        );
    }

    #[test]
    fn flat_series_produces_zero_metrics() {
        let bars = flat_bars(&[100.0; 250]);
        let frame = compute_indicators(&bars, &IndicatorSettings::default());
        let params = StrategyParams::default();

        for name in ["sma_crossover", "rsi_mean_reversion", "macd_momentum", "dual_momentum"] {
            let strategy = Strategy::from_name(name, &params).unwrap();
            let result =
                run_backtest(&bars, &frame, &strategy, &BacktestConfig::default()).unwrap();
            let m = &result.metrics;
            assert_eq!(m.total_trades, 0, "{}", name);
            assert_eq!(m.total_return, 0.0);
            assert_eq!(m.sharpe_ratio, 0.0);
            assert_eq!(m.win_rate, 0.0);
        }
    }

    #[test]
    fn series_shorter_than_lookback_has_no_trades() {
        let bars = make_bars(&wave_closes(14, 100.0, 5.0, 0.7));
        let frame = compute_indicators(&bars, &IndicatorSettings::default());
        let strategies = Strategy::all(&StrategyParams::default());

        for result in run_many(&bars, &frame, &strategies, &BacktestConfig::default()) {
            let result = result.unwrap();
            assert!(result.trades.is_empty());
            assert_eq!(result.metrics, Metrics::empty(10_000.0));
        }
    }

    #[test]
    fn open_long_is_force_closed_and_counted() {
        let bars = flat_bars(&[100.0, 100.0, 105.0, 125.0]);
        let frame = sma_frame(&[99.0, 101.0, 102.0, 103.0], &[100.0; 4]);

        let result = run_backtest(&bars, &frame, &sma_strategy(), &zero_commission()).unwrap();

        let closing: Vec<_> = result
            .trades
            .iter()
            .filter(|t| !t.action.is_opening())
            .collect();
        assert_eq!(closing.len(), 1);
        assert_eq!(closing[0].index, 3);
        assert_eq!(closing[0].price, 125.0);
        assert_eq!(result.metrics.total_trades, 1);
        assert_relative_eq!(result.metrics.total_pnl, 95.0 * 25.0, epsilon = 1e-9);
    }

    #[test]
    fn commission_reduces_realized_pnl() {
        let bars = flat_bars(&[100.0, 100.0, 110.0]);
        let frame = sma_frame(&[99.0, 101.0, 102.0], &[100.0; 3]);
        let config = BacktestConfig {
            commission_rate: 0.001,
            ..zero_commission()
        };

        let result = run_backtest(&bars, &frame, &sma_strategy(), &config).unwrap();

        let size = 10_000.0 * 0.95 / 100.0;
        let expected = (110.0 - 100.0) * size - (100.0 + 110.0) * size * 0.001;
        assert_relative_eq!(result.metrics.total_pnl, expected, epsilon = 1e-9);
        assert_relative_eq!(
            result.metrics.total_commission,
            (100.0 + 110.0) * size * 0.001,
            epsilon = 1e-9
        );
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn loads_and_runs_every_strategy() {
        let bars = make_bars(&wave_closes(300, 100.0, 15.0, 0.08));
        let port = MockDataPort::new().with_bars("BTC", bars);

        let bars = load_series(&port, "BTC", &daily_request()).unwrap();
        let frame = compute_indicators(&bars, &IndicatorSettings::default());
        let strategies = Strategy::all(&StrategyParams::default());
        let results = run_many(&bars, &frame, &strategies, &BacktestConfig::default());

        assert_eq!(results.len(), 5);
        for result in results {
            let result = result.unwrap();
            assert!(result.positions.iter().all(|p| p.is_closed()));
            assert_eq!(result.trades.len(), result.positions.len() * 2);
        }
    }

    #[test]
    fn macd_trades_on_oscillating_series() {
        let bars = make_bars(&wave_closes(300, 100.0, 15.0, 0.08));
        let frame = compute_indicators(&bars, &IndicatorSettings::default());

        let result =
            run_backtest(&bars, &frame, &Strategy::MacdMomentum, &BacktestConfig::default())
                .unwrap();

        assert!(result.metrics.total_trades > 0);
        assert!(result.trades[0].index >= 34);
    }

    #[test]
    fn bollinger_trades_band_breakouts() {
        // Alternating 100/101 closes with a spike above the bands at 40 and
        // a drop below them at 80.
        let mut closes: Vec<f64> = (0..120).map(|i| 100.0 + (i % 2) as f64).collect();
        closes[40] = 120.0;
        closes[80] = 80.0;
        let bars = flat_bars(&closes);
        let frame = compute_indicators(&bars, &IndicatorSettings::default());

        let result =
            run_backtest(&bars, &frame, &Strategy::BollingerBands, &zero_commission()).unwrap();

        assert_eq!(
            actions(&result.trades),
            vec![
                (40, TradeAction::Short),
                (41, TradeAction::Cover),
                (80, TradeAction::Buy),
                (119, TradeAction::Sell),
            ]
        );
        assert_eq!(result.metrics.short_trades, 1);
        assert_eq!(result.metrics.long_trades, 1);
        assert!(result.metrics.total_pnl > 0.0);
    }

    #[test]
    fn universe_skips_unusable_symbols() {
        let port = MockDataPort::new()
            .with_bars("BTC", make_bars(&wave_closes(120, 100.0, 10.0, 0.1)))
            .with_bars("ETH", vec![])
            .with_error("SOL", "rate limited");
        let symbols = vec!["BTC".to_string(), "ETH".to_string(), "SOL".to_string()];

        let loaded = load_universe(&port, &symbols, &daily_request()).unwrap();

        assert_eq!(loaded.series.len(), 1);
        assert_eq!(loaded.skipped.len(), 2);
        assert!(loaded.skipped[1].reason.contains("rate limited"));
    }

    #[test]
    fn unordered_series_is_refused() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars.swap(0, 1);
        let port = MockDataPort::new().with_bars("BTC", bars);

        let err = load_series(&port, "BTC", &daily_request()).unwrap_err();
        assert!(matches!(err, BacktestError::NonMonotonicTimestamps { index: 1 }));
    }
}

// ── Properties ─────────────────────────────────────────────────────

fn arb_closes() -> impl PropStrategy<Value = Vec<f64>> {
    prop::collection::vec(-0.06..0.06_f64, 60..160).prop_map(|returns| {
        let mut price = 100.0;
        returns
            .into_iter()
            .map(|r| {
                price *= 1.0 + r;
                price
            })
            .collect()
    })
}

proptest! {
    /// Positions never overlap, and every one is closed by the end of the run.
    #[test]
    fn at_most_one_open_position(closes in arb_closes(), allow_short in any::<bool>()) {
        let bars = make_bars(&closes);
        let frame = compute_indicators(&bars, &IndicatorSettings::default());
        let config = BacktestConfig { allow_short, ..BacktestConfig::default() };

        for strategy in Strategy::all(&StrategyParams::default()) {
            let result = run_backtest(&bars, &frame, &strategy, &config).unwrap();
            let mut last_exit = 0;
            for p in &result.positions {
                let exit = p.exit_index.unwrap();
                prop_assert!(p.entry_index >= last_exit);
                prop_assert!(exit >= p.entry_index);
                last_exit = exit;
            }
            for pair in result.trades.chunks(2) {
                prop_assert!(pair[0].action.is_opening());
                prop_assert!(!pair[1].action.is_opening());
            }
            if !allow_short {
                prop_assert_eq!(result.metrics.short_trades, 0);
            }
        }
    }

    /// Gross P&L is positive exactly when price moved in the position's favour.
    #[test]
    fn pnl_sign_matches_direction(closes in arb_closes()) {
        let bars = make_bars(&closes);
        let frame = compute_indicators(&bars, &IndicatorSettings::default());

        for strategy in Strategy::all(&StrategyParams::default()) {
            let result = run_backtest(&bars, &frame, &strategy, &zero_commission()).unwrap();
            for p in &result.positions {
                let exit = p.exit_price.unwrap();
                let pnl = p.realized_pnl(0.0).unwrap();
                match p.side {
                    Side::Long => prop_assert_eq!(pnl > 0.0, exit > p.entry_price),
                    Side::Short => prop_assert_eq!(pnl > 0.0, exit < p.entry_price),
                }
            }
        }
    }

    /// Commission in the metrics equals the sum over executions of price × qty × rate.
    #[test]
    fn commission_balances(closes in arb_closes(), rate in 0.0..0.01_f64) {
        let bars = make_bars(&closes);
        let frame = compute_indicators(&bars, &IndicatorSettings::default());
        let config = BacktestConfig { commission_rate: rate, ..BacktestConfig::default() };

        for strategy in Strategy::all(&StrategyParams::default()) {
            let result = run_backtest(&bars, &frame, &strategy, &config).unwrap();
            let from_trades: f64 = result
                .trades
                .iter()
                .map(|t| t.price * t.quantity * rate)
                .sum();
            let recorded: f64 = result.trades.iter().map(|t| t.commission).sum();
            prop_assert!((from_trades - recorded).abs() <= 1e-9 * from_trades.max(1.0));
            prop_assert!((result.metrics.total_commission - from_trades).abs() <= 1e-9 * from_trades.max(1.0));
        }
    }

    /// The metrics reduction is a pure function of the position list.
    #[test]
    fn metrics_are_pure(closes in arb_closes()) {
        let bars = make_bars(&closes);
        let frame = compute_indicators(&bars, &IndicatorSettings::default());
        let config = BacktestConfig::default();

        for strategy in Strategy::all(&StrategyParams::default()) {
            let result = run_backtest(&bars, &frame, &strategy, &config).unwrap();
            let first = Metrics::compute(&result.positions, config.commission_rate, config.initial_capital);
            let second = Metrics::compute(&result.positions, config.commission_rate, config.initial_capital);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first, &result.metrics);
        }
    }
}
