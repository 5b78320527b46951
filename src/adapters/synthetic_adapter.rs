//! Synthetic market-data adapter.
//!
//! Produces a seeded geometric random walk so runs can be reproduced without
//! any data files. Selected only by explicit configuration; results from
//! synthetic data say nothing about a real market.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;

pub const DAILY_DRIFT: f64 = 0.001;
pub const DAILY_VOLATILITY: f64 = 0.03;

#[derive(Debug, Clone)]
pub struct SyntheticDataAdapter {
    bars: usize,
    seed: u64,
    start_price: f64,
}

impl SyntheticDataAdapter {
    pub fn new(bars: usize, seed: u64, start_price: f64) -> Self {
        Self {
            bars,
            seed,
            start_price,
        }
    }

    /// Seed mixed with the symbol so each symbol gets its own path.
    fn symbol_seed(&self, symbol: &str) -> u64 {
        symbol
            .to_uppercase()
            .bytes()
            .fold(self.seed ^ 0xcbf2_9ce4_8422_2325, |acc, b| {
                (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            })
    }

    pub fn generate(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        step: Duration,
    ) -> Result<Vec<Bar>, BacktestError> {
        let returns = Normal::new(DAILY_DRIFT, DAILY_VOLATILITY).map_err(|e| BacktestError::Data {
            reason: format!("invalid return distribution: {}", e),
        })?;
        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));
        let mut bars = Vec::with_capacity(self.bars);
        let mut close = self.start_price;

        for i in 0..self.bars {
            let ret = returns.sample(&mut rng);
            let prev_close = close;
            close = (prev_close * (1.0 + ret)).max(f64::MIN_POSITIVE);

            let open = if i == 0 {
                self.start_price
            } else {
                prev_close * (1.0 + rng.gen_range(-0.01..0.01))
            };
            let high = open.max(close) * (1.0 + rng.gen_range(0.005..0.02));
            let low = open.min(close) * (1.0 - rng.gen_range(0.005..0.02));
            let volume = rng.gen_range(1_000.0..10_000.0);

            bars.push(Bar {
                timestamp: start + step * i as i32,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        Ok(bars)
    }
}

/// Bar spacing for interval strings such as `1m`, `15m`, `4h`, `1d`, `1w`.
pub fn interval_duration(interval: &str) -> Option<Duration> {
    let interval = interval.trim();
    let split = interval.find(|c: char| !c.is_ascii_digit())?;
    let (count, unit) = interval.split_at(split);
    let count: i64 = count.parse().ok().filter(|c| *c > 0)?;
    match unit {
        "m" => Some(Duration::minutes(count)),
        "h" => Some(Duration::hours(count)),
        "d" => Some(Duration::days(count)),
        "w" => Some(Duration::weeks(count)),
        _ => None,
    }
}

fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

impl DataPort for SyntheticDataAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        interval: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bar>, BacktestError> {
        let step = interval_duration(interval).ok_or_else(|| BacktestError::Data {
            reason: format!("unsupported interval '{}'", interval),
        })?;

        debug!(symbol, bars = self.bars, seed = self.seed, "generating synthetic series");

        let mut bars = self.generate(symbol, start.unwrap_or_else(default_start), step)?;
        if let Some(end) = end {
            bars.retain(|b| b.timestamp <= end);
        }
        Ok(bars)
    }

    fn list_symbols(&self, _interval: &str) -> Result<Vec<String>, BacktestError> {
        Ok(Vec::new())
    }
}
