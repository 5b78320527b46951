//! Directional positions and their realized P&L.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn direction(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// One directional exposure. Closed at most once; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_index: usize,
    pub entry_price: f64,
    pub size: f64,
    pub exit_index: Option<usize>,
    pub exit_price: Option<f64>,
}

impl Position {
    pub fn new(side: Side, entry_index: usize, entry_price: f64, size: f64) -> Self {
        Position {
            side,
            entry_index,
            entry_price,
            size,
            exit_index: None,
            exit_price: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// Directional P&L before commission.
    pub fn gross_pnl(&self, exit_price: f64) -> f64 {
        self.side.direction() * (exit_price - self.entry_price) * self.size
    }

    /// Commission on both legs: (entry + exit) × size × rate.
    pub fn round_trip_commission(&self, exit_price: f64, commission_rate: f64) -> f64 {
        (self.entry_price + exit_price) * self.size * commission_rate
    }

    /// Realized P&L net of commission, or `None` while the position is open.
    pub fn realized_pnl(&self, commission_rate: f64) -> Option<f64> {
        self.exit_price.map(|exit| {
            self.gross_pnl(exit) - self.round_trip_commission(exit, commission_rate)
        })
    }
}
