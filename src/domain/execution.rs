//! Fill pricing: slippage, commission and order outcomes.
//!
//! Slippage always moves the fill against the trader. Commission is a
//! fraction of fill notional and is charged on both sides.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commission and slippage, both as fractions (0.001 = 0.1%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_pct: 0.001,
            slippage_pct: 0.0005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Filled,
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Outcome of an order submission. A rejection is a normal outcome, not an
/// error; the account is untouched when `status == Rejected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub fill_price: f64,
    pub status: OrderStatus,
    pub commission: f64,
    pub message: String,
}

impl OrderResult {
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}

/// Buy: price * (1 + slippage). Sell: price * (1 - slippage).
pub fn apply_slippage(market_price: f64, side: OrderSide, slippage_pct: f64) -> f64 {
    match side {
        OrderSide::Buy => market_price * (1.0 + slippage_pct),
        OrderSide::Sell => market_price * (1.0 - slippage_pct),
    }
}

/// fill_price * quantity * commission_pct
pub fn calculate_commission(fill_price: f64, quantity: f64, commission_pct: f64) -> f64 {
    fill_price * quantity * commission_pct
}
