//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod indicator_frame;
pub mod ledger;
pub mod metrics;
pub mod ohlcv;
pub mod position;
pub mod strategy;
pub mod trade;
pub mod universe;
