//! CSV trade log export.
//!
//! One row per execution in chronological order:
//! `timestamp,action,price,quantity,position_type,commission,total_cost`.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::trade::Trade;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct TradeRow {
    timestamp: String,
    action: String,
    price: f64,
    quantity: f64,
    position_type: String,
    commission: f64,
    total_cost: f64,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        TradeRow {
            timestamp: trade.timestamp.to_rfc3339(),
            action: trade.action.to_string(),
            price: trade.price,
            quantity: trade.quantity,
            position_type: trade.position_type().to_string(),
            commission: trade.commission,
            total_cost: trade.total_cost(),
        }
    }
}

fn export_error(e: impl std::fmt::Display) -> BacktestError {
    BacktestError::Export {
        reason: e.to_string(),
    }
}

/// Render trades as CSV text, header included.
pub fn trades_to_csv(trades: &[Trade]) -> Result<String, BacktestError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for trade in trades {
        wtr.serialize(TradeRow::from(trade)).map_err(export_error)?;
    }
    let data = wtr.into_inner().map_err(export_error)?;
    String::from_utf8(data).map_err(export_error)
}

#[derive(Debug, Default)]
pub struct CsvTradeExporter;

impl CsvTradeExporter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for CsvTradeExporter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), BacktestError> {
        if result.trades.is_empty() {
            warn!(strategy = %result.strategy, "no trades to export, skipping {}", output_path);
            return Ok(());
        }

        let mut trades = result.trades.clone();
        trades.sort_by_key(|t| (t.timestamp, t.index));
        let content = trades_to_csv(&trades)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(export_error)?;
        }
        fs::write(path, content).map_err(export_error)?;

        info!(trades = trades.len(), path = output_path, "trade log exported");
        Ok(())
    }
}
