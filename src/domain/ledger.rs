//! Position ledger: the single open position, closed history, and executions.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::error::LedgerError;
use crate::domain::position::{Position, Side};
use crate::domain::trade::{Trade, TradeAction};

#[derive(Debug, Clone)]
pub struct PositionLedger {
    commission_rate: f64,
    capital: f64,
    open: Option<Position>,
    closed: Vec<Position>,
    trades: Vec<Trade>,
}

impl PositionLedger {
    pub fn new(initial_capital: f64, commission_rate: f64) -> Self {
        PositionLedger {
            commission_rate,
            capital: initial_capital,
            open: None,
            closed: Vec::new(),
            trades: Vec::new(),
        }
    }

    /// Initial capital plus realized P&L; unrealized marks are never included.
    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn current_side(&self) -> Option<Side> {
        self.open.as_ref().map(|p| p.side)
    }

    pub fn is_flat(&self) -> bool {
        self.open.is_none()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn open(
        &mut self,
        side: Side,
        index: usize,
        timestamp: DateTime<Utc>,
        price: f64,
        size: f64,
    ) -> Result<(), LedgerError> {
        if self.open.is_some() {
            return Err(LedgerError::PositionAlreadyOpen { index, side });
        }
        if !size.is_finite() || size <= 0.0 {
            return Err(LedgerError::InvalidSize { index, size });
        }

        let trade = Trade::new(
            index,
            timestamp,
            TradeAction::opening(side),
            price,
            size,
            self.commission_rate,
        );
        debug!(index, %side, price, size, "open position");
        self.trades.push(trade);
        self.open = Some(Position::new(side, index, price, size));
        Ok(())
    }

    /// Close the open position and return its realized P&L.
    pub fn close(
        &mut self,
        index: usize,
        timestamp: DateTime<Utc>,
        price: f64,
    ) -> Result<f64, LedgerError> {
        let mut position = self.open.take().ok_or(LedgerError::NoOpenPosition { index })?;
        position.exit_index = Some(index);
        position.exit_price = Some(price);

        let pnl = position.gross_pnl(price) - position.round_trip_commission(price, self.commission_rate);
        self.capital += pnl;

        let trade = Trade::new(
            index,
            timestamp,
            TradeAction::closing(position.side),
            price,
            position.size,
            self.commission_rate,
        );
        debug!(index, side = %position.side, price, pnl, capital = self.capital, "close position");
        self.trades.push(trade);
        self.closed.push(position);
        Ok(pnl)
    }

    /// Close any position still open at the end of a run. The resulting
    /// position and trade are indistinguishable from a signal-driven close.
    pub fn force_close(
        &mut self,
        index: usize,
        timestamp: DateTime<Utc>,
        price: f64,
    ) -> Result<Option<f64>, LedgerError> {
        if self.open.is_none() {
            return Ok(None);
        }
        debug!(index, price, "force close at end of series");
        self.close(index, timestamp, price).map(Some)
    }

    /// Consume the ledger, yielding closed positions and trades.
    pub fn into_parts(self) -> (Vec<Position>, Vec<Trade>) {
        (self.closed, self.trades)
    }
}
