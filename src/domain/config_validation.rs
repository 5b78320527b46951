//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::domain::error::BacktestError;
use crate::domain::indicator_frame::IndicatorSettings;
use crate::domain::strategy::{Strategy, StrategyParams};
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 2] = ["csv", "synthetic"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_source(config)?;
    validate_dates(config)?;
    validate_synthetic(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_strategy_name(config)?;
    validate_strategy_params(config)
}

/// Parameter checks only, for runs that pick the strategy elsewhere.
pub fn validate_strategy_params(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_periods(config)?;
    validate_thresholds(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    if !DATA_SOURCES.contains(&source.trim().to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown data source '{}', expected csv or synthetic", source),
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start = config
        .get_string("data", "start")
        .map(|s| parse_date_bound(&s, "data", "start", false))
        .transpose()?;
    let end = config
        .get_string("data", "end")
        .map(|s| parse_date_bound(&s, "data", "end", true))
        .transpose()?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid("data", "start", "start must not be after end"));
        }
    }
    Ok(())
}

/// Parse a configured date bound. A bare `YYYY-MM-DD` covers the whole day:
/// midnight for a start bound, the last second of the day for an end bound.
pub fn parse_date_bound(
    value: &str,
    section: &str,
    key: &str,
    end_of_day: bool,
) -> Result<DateTime<Utc>, BacktestError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        invalid(
            section,
            key,
            format!("invalid {} format, expected YYYY-MM-DD or RFC 3339", key),
        )
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| invalid(section, key, "invalid time of day"))?;

    Ok(date.and_time(time).and_utc())
}

fn validate_synthetic(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if config.get_int("data", "synthetic_bars", 365) < 1 {
        return Err(invalid("data", "synthetic_bars", "synthetic_bars must be at least 1"));
    }
    if config.get_double("data", "synthetic_start_price", 40_000.0) <= 0.0 {
        return Err(invalid(
            "data",
            "synthetic_start_price",
            "synthetic_start_price must be positive",
        ));
    }
    if config.get_int("data", "synthetic_seed", 42) < 0 {
        return Err(invalid("data", "synthetic_seed", "synthetic_seed must be non-negative"));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("backtest", "initial_capital", 10_000.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("backtest", "commission", 0.001);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "commission",
            "commission must be between 0 (inclusive) and 1 (exclusive)",
        ));
    }
    Ok(())
}

fn validate_strategy_name(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("strategy", "name") {
        Some(name) if !name.trim().is_empty() => {
            Strategy::from_name(&name, &StrategyParams::default()).map(|_| ())
        }
        _ => Err(BacktestError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        }),
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let windows = IndicatorSettings::default().sma_windows;
    let defaults = StrategyParams::default();
    let fast = config.get_int("strategy", "fast_period", defaults.fast_period as i64);
    let slow = config.get_int("strategy", "slow_period", defaults.slow_period as i64);

    for (key, value) in [("fast_period", fast), ("slow_period", slow)] {
        let computed = usize::try_from(value).is_ok_and(|v| windows.contains(&v));
        if !computed {
            return Err(invalid(
                "strategy",
                key,
                format!("{} must be one of {:?}", key, windows),
            ));
        }
    }
    if fast >= slow {
        return Err(invalid(
            "strategy",
            "fast_period",
            "fast_period must be less than slow_period",
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let defaults = StrategyParams::default();
    let oversold = config.get_double("strategy", "oversold", defaults.oversold);
    let overbought = config.get_double("strategy", "overbought", defaults.overbought);

    if !(oversold > 0.0 && oversold < 100.0) {
        return Err(invalid("strategy", "oversold", "oversold must be between 0 and 100"));
    }
    if !(overbought > 0.0 && overbought < 100.0) {
        return Err(invalid(
            "strategy",
            "overbought",
            "overbought must be between 0 and 100",
        ));
    }
    if oversold >= overbought {
        return Err(invalid(
            "strategy",
            "oversold",
            "oversold must be less than overbought",
        ));
    }
    Ok(())
}
