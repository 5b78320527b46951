//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::error::BacktestError;

pub const DEFAULT_LEVEL: &str = "info";

/// Initialize logging with the given level. `RUST_LOG` takes precedence.
/// Diagnostics go to stderr so reports on stdout stay clean.
pub fn init_logging(level: &str) -> Result<(), BacktestError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| BacktestError::Logging {
            reason: e.to_string(),
        })
}
