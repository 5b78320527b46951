//! Domain error types.

use crate::domain::position::Side;

/// Violations of the single-open-position invariant.
///
/// These only occur when a strategy predicate asks the ledger for a transition
/// that is impossible in its current state, so they always abort the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("cannot open {side} position at bar {index}: a position is already open")]
    PositionAlreadyOpen { index: usize, side: Side },

    #[error("cannot close position at bar {index}: no position is open")]
    NoOpenPosition { index: usize },

    #[error("invalid position size {size} at bar {index}")]
    InvalidSize { index: usize, size: f64 },
}

/// Top-level error type for cryptobacktest.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("strategy requires indicator {indicator} which was not computed")]
    MissingIndicator { indicator: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no bars for {symbol}")]
    EmptySeries { symbol: String },

    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("timestamps are not strictly increasing at index {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("trade export error: {reason}")]
    Export { reason: String },

    #[error("logging setup failed: {reason}")]
    Logging { reason: String },

    #[error("ledger invariant violated: {0}")]
    Invariant(#[from] LedgerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Export { .. } | BacktestError::Logging { .. } => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::UnknownStrategy { .. } | BacktestError::MissingIndicator { .. } => 4,
            BacktestError::EmptySeries { .. }
            | BacktestError::MalformedBar { .. }
            | BacktestError::NonMonotonicTimestamps { .. } => 5,
            BacktestError::Invariant(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
