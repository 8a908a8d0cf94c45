//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod execution;
pub mod position;
pub mod portfolio;
pub mod sizing;
pub mod risk;
pub mod backtest;
pub mod metrics;
pub mod trading;
pub mod settings;
pub mod config_validation;
pub mod error;
