//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;

/// Port for writing the artifacts of a finished run.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), BacktestError>;
}
