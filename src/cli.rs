//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_trade_export::CsvTradeExporter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::synthetic_adapter::SyntheticDataAdapter;
use crate::adapters::text_report;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date_bound, validate_backtest_config, validate_config, validate_data_config,
    validate_strategy_params,
};
use crate::domain::error::BacktestError;
use crate::domain::indicator_frame::{compute_indicators, IndicatorSettings};
use crate::domain::ohlcv::SeriesSummary;
use crate::domain::strategy::{Strategy, StrategyParams};
use crate::domain::universe::{load_series, load_universe, parse_symbols, SeriesRequest};
use crate::logging::{init_logging, DEFAULT_LEVEL};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_SYMBOL: &str = "BTC";
pub const DEFAULT_INTERVAL: &str = "1d";
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Parser, Debug)]
#[command(name = "cryptobacktest", about = "Strategy backtester for OHLCV price series")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy against one symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [strategy] name
        #[arg(short, long)]
        strategy: Option<String>,
        /// Overrides [data] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Write the trade log to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every strategy against one symbol
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Run the configured strategy across several symbols
    CompareAssets {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated list, overrides [data] symbols
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Summarize the data available for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Check a configuration without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            strategy,
            symbol,
            output,
        } => run_backtest(&config, strategy.as_deref(), symbol.as_deref(), output.as_deref()),
        Command::Compare { config, symbol } => run_compare(&config, symbol.as_deref()),
        Command::CompareAssets { config, symbols } => {
            run_compare_assets(&config, symbols.as_deref())
        }
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load the INI file and start logging at its `[logging] level`.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let level = adapter
        .get_string("logging", "level")
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    // A subscriber may already be installed when run() is called more than once.
    if let Err(e) = init_logging(&level) {
        eprintln!("warning: {e}");
    }
    info!(path = %path.display(), "loaded config");
    Ok(adapter)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    validate_backtest_config(adapter)?;
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        commission_rate: adapter.get_double("backtest", "commission", defaults.commission_rate),
        allow_short: adapter.get_bool("backtest", "allow_short", defaults.allow_short),
    })
}

pub fn build_strategy_params(adapter: &dyn ConfigPort) -> Result<StrategyParams, BacktestError> {
    validate_strategy_params(adapter)?;
    let defaults = StrategyParams::default();
    let period = |key: &str, default: usize| {
        usize::try_from(adapter.get_int("strategy", key, default as i64)).unwrap_or(default)
    };
    Ok(StrategyParams {
        fast_period: period("fast_period", defaults.fast_period),
        slow_period: period("slow_period", defaults.slow_period),
        oversold: adapter.get_double("strategy", "oversold", defaults.oversold),
        overbought: adapter.get_double("strategy", "overbought", defaults.overbought),
    })
}

/// Strategy named on the command line, else `[strategy] name`.
pub fn build_strategy(
    adapter: &dyn ConfigPort,
    name_override: Option<&str>,
) -> Result<Strategy, BacktestError> {
    let params = build_strategy_params(adapter)?;
    let name = match name_override {
        Some(name) => name.to_string(),
        None => adapter
            .get_string("strategy", "name")
            .ok_or_else(|| BacktestError::ConfigMissing {
                section: "strategy".into(),
                key: "name".into(),
            })?,
    };
    Strategy::from_name(&name, &params)
}

pub fn build_series_request(adapter: &dyn ConfigPort) -> Result<SeriesRequest, BacktestError> {
    validate_data_config(adapter)?;
    let start = adapter
        .get_string("data", "start")
        .map(|s| parse_date_bound(&s, "data", "start", false))
        .transpose()?;
    let end = adapter
        .get_string("data", "end")
        .map(|s| parse_date_bound(&s, "data", "end", true))
        .transpose()?;

    let resample_daily = match adapter.get_string("data", "resample") {
        None => false,
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "1d" => true,
            "none" | "" => false,
            other => {
                return Err(BacktestError::ConfigInvalid {
                    section: "data".into(),
                    key: "resample".into(),
                    reason: format!("unsupported resample '{}', expected daily", other),
                });
            }
        },
    };

    Ok(SeriesRequest {
        interval: adapter
            .get_string("data", "interval")
            .unwrap_or_else(|| DEFAULT_INTERVAL.to_string()),
        start,
        end,
        resample_daily,
    })
}

pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, BacktestError> {
    validate_data_config(adapter)?;
    let source = adapter
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .trim()
        .to_ascii_lowercase();

    if source == "synthetic" {
        let bars = adapter.get_int("data", "synthetic_bars", 365);
        let seed = adapter.get_int("data", "synthetic_seed", 42);
        warn!(bars, seed, "data source is synthetic, results do not reflect a real market");
        return Ok(Box::new(SyntheticDataAdapter::new(
            usize::try_from(bars).unwrap_or(365),
            u64::try_from(seed).unwrap_or(42),
            adapter.get_double("data", "synthetic_start_price", 40_000.0),
        )));
    }

    let data_dir = adapter
        .get_string("data", "data_dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    info!(data_dir = %data_dir, "reading csv data");
    Ok(Box::new(CsvAdapter::new(PathBuf::from(data_dir))))
}

fn configured_symbol(adapter: &dyn ConfigPort, symbol_override: Option<&str>) -> String {
    symbol_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("data", "symbol"))
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
        .trim()
        .to_uppercase()
}

/// `--symbols`, else `[data] symbols`, else the single `[data] symbol`.
pub fn configured_universe(
    adapter: &dyn ConfigPort,
    symbols_override: Option<&str>,
) -> Result<Vec<String>, BacktestError> {
    let raw = symbols_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("data", "symbols"))
        .unwrap_or_else(|| configured_symbol(adapter, None));
    parse_symbols(&raw).map_err(|e| BacktestError::ConfigInvalid {
        section: "data".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })
}

fn run_backtest(
    config_path: &Path,
    strategy_override: Option<&str>,
    symbol_override: Option<&str>,
    output: Option<&Path>,
) -> Result<(), BacktestError> {
    // Stage 1: Load and validate config
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    let strategy = build_strategy(&adapter, strategy_override)?;
    let request = build_series_request(&adapter)?;
    let data_port = build_data_port(&adapter)?;
    let symbol = configured_symbol(&adapter, symbol_override);

    // Stage 2: Load data
    info!(symbol = %symbol, interval = %request.interval, "loading series");
    let bars = load_series(data_port.as_ref(), &symbol, &request)?;

    // Stage 3: Compute indicators
    info!(bars = bars.len(), "computing indicators");
    let frame = compute_indicators(&bars, &IndicatorSettings::default());

    // Stage 4: Run
    let result = backtest_engine::run_backtest(&bars, &frame, &strategy, &config)?;
    print!(
        "{}",
        text_report::render_performance_report(&result.metrics, &strategy, &symbol)
    );

    // Stage 5: Export trades
    if let Some(path) = output {
        let path_str = path.to_string_lossy();
        CsvTradeExporter::new().write(&result, &path_str)?;
        if !result.trades.is_empty() {
            println!("\nTrades written to: {}", path.display());
        }
    }

    Ok(())
}

fn run_compare(config_path: &Path, symbol_override: Option<&str>) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    let params = build_strategy_params(&adapter)?;
    let request = build_series_request(&adapter)?;
    let data_port = build_data_port(&adapter)?;
    let symbol = configured_symbol(&adapter, symbol_override);

    info!(symbol = %symbol, interval = %request.interval, "loading series");
    let bars = load_series(data_port.as_ref(), &symbol, &request)?;
    let frame = compute_indicators(&bars, &IndicatorSettings::default());

    let strategies = Strategy::all(&params);
    info!(strategies = strategies.len(), "running strategy comparison");
    let results = backtest_engine::run_many(&bars, &frame, &strategies, &config)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    print!("{}", text_report::render_strategy_comparison(&results, &symbol));
    Ok(())
}

fn run_compare_assets(
    config_path: &Path,
    symbols_override: Option<&str>,
) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    let strategy = build_strategy(&adapter, None)?;
    let request = build_series_request(&adapter)?;
    let data_port = build_data_port(&adapter)?;
    let symbols = configured_universe(&adapter, symbols_override)?;

    info!(symbols = symbols.len(), "loading universe");
    let universe = load_universe(data_port.as_ref(), &symbols, &request)?;

    let settings = IndicatorSettings::default();
    let results = universe
        .series
        .par_iter()
        .map(|(symbol, bars)| {
            let frame = compute_indicators(bars, &settings);
            backtest_engine::run_backtest(bars, &frame, &strategy, &config)
                .map(|result| (symbol.clone(), result))
        })
        .collect::<Result<Vec<(String, BacktestResult)>, _>>()?;

    print!("{}", text_report::render_asset_comparison(&results, &strategy));
    for skipped in &universe.skipped {
        println!("Skipped {}: {}", skipped.symbol, skipped.reason);
    }
    Ok(())
}

fn run_info(config_path: &Path, symbol_override: Option<&str>) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    let request = build_series_request(&adapter)?;
    let data_port = build_data_port(&adapter)?;
    let symbol = configured_symbol(&adapter, symbol_override);

    let available = data_port.list_symbols(&request.interval)?;
    if !available.is_empty() {
        println!("Available symbols ({}): {}", request.interval, available.join(", "));
    }

    let bars = load_series(data_port.as_ref(), &symbol, &request)?;
    let Some(summary) = SeriesSummary::from_bars(&bars) else {
        return Err(BacktestError::EmptySeries { symbol });
    };

    println!("\n{} ({})", symbol, request.interval);
    println!("  Bars:           {}", summary.bars);
    println!("  First:          {}", summary.first_timestamp.to_rfc3339());
    println!("  Last:           {}", summary.last_timestamp.to_rfc3339());
    println!("  First Close:    {:.2}", summary.first_close);
    println!("  Last Close:     {:.2}", summary.last_close);
    println!("  Price Change:   {:.2}%", summary.price_change_pct);
    println!("  Highest High:   {:.2}", summary.highest);
    println!("  Lowest Low:     {:.2}", summary.lowest);
    println!("  Avg Volume:     {:.2}", summary.avg_volume);

    if request.start.is_some() || request.end.is_some() {
        if let Some((first, last, count)) = data_port.get_data_range(&symbol, &request.interval)? {
            println!(
                "  Full History:   {} to {} ({} bars)",
                first.to_rfc3339(),
                last.to_rfc3339(),
                count
            );
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    let strategy = build_strategy(&adapter, None)?;
    let request = build_series_request(&adapter)?;
    let config = build_backtest_config(&adapter)?;
    let source = adapter
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    println!("Config validated successfully");
    println!("\nStrategy: {} ({})", strategy, strategy.id());
    println!("\nIndicators required:");
    for indicator in strategy.required_indicators() {
        println!("  {}", indicator);
    }
    println!("\nData:");
    println!("  source:   {}", source);
    println!("  symbols:  {}", configured_universe(&adapter, None)?.join(", "));
    println!("  interval: {}", request.interval);
    println!("\nBacktest:");
    println!("  initial_capital: {:.2}", config.initial_capital);
    println!("  commission:      {}", config.commission_rate);
    println!("  allow_short:     {}", config.allow_short);
    Ok(())
}
