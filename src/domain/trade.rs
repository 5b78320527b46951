//! Immutable execution records.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::position::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeAction {
    Buy,
    Sell,
    Short,
    Cover,
}

impl TradeAction {
    pub fn opening(side: Side) -> Self {
        match side {
            Side::Long => TradeAction::Buy,
            Side::Short => TradeAction::Short,
        }
    }

    pub fn closing(side: Side) -> Self {
        match side {
            Side::Long => TradeAction::Sell,
            Side::Short => TradeAction::Cover,
        }
    }

    pub fn is_opening(self) -> bool {
        matches!(self, TradeAction::Buy | TradeAction::Short)
    }

    pub fn position_type(self) -> PositionType {
        match self {
            TradeAction::Buy | TradeAction::Sell => PositionType::Spot,
            TradeAction::Short | TradeAction::Cover => PositionType::Futures,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Short => write!(f, "short"),
            TradeAction::Cover => write!(f, "cover"),
        }
    }
}

/// Venue an execution would route to: long legs are spot, short legs futures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionType {
    Spot,
    Futures,
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionType::Spot => write!(f, "spot"),
            PositionType::Futures => write!(f, "futures"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
}

impl Trade {
    pub fn new(
        index: usize,
        timestamp: DateTime<Utc>,
        action: TradeAction,
        price: f64,
        quantity: f64,
        commission_rate: f64,
    ) -> Self {
        Trade {
            index,
            timestamp,
            action,
            price,
            quantity,
            commission: price * quantity * commission_rate,
        }
    }

    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }

    /// Net cash moved by this execution: notional plus commission on opening
    /// legs, notional less commission on closing legs.
    pub fn total_cost(&self) -> f64 {
        if self.action.is_opening() {
            self.notional() + self.commission
        } else {
            self.notional() - self.commission
        }
    }

    pub fn position_type(&self) -> PositionType {
        self.action.position_type()
    }
}
