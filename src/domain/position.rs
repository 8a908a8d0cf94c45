//! Open positions and closed-trade records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::execution::OrderSide;

/// Quantities at or below this are treated as flat.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Mutable per-symbol position owned by an account. Entry price is the
/// volume-weighted average of every same-direction fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub stop_loss: Option<f64>,
}

impl Position {
    pub fn open(symbol: &str, quantity: f64, fill_price: f64, stop_loss: Option<f64>) -> Self {
        Position {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            quantity,
            entry_price: fill_price,
            current_price: fill_price,
            stop_loss,
        }
    }

    /// Merge another fill into the position. The stop-loss is replaced, not merged.
    pub fn add(&mut self, quantity: f64, fill_price: f64, stop_loss: Option<f64>) {
        let new_qty = self.quantity + quantity;
        self.entry_price = (self.entry_price * self.quantity + fill_price * quantity) / new_qty;
        self.quantity = new_qty;
        self.stop_loss = stop_loss;
    }

    /// Remove up to `quantity` and return what was actually removed.
    pub fn reduce(&mut self, quantity: f64) -> f64 {
        let removed = quantity.min(self.quantity);
        self.quantity -= removed;
        removed
    }

    pub fn is_flat(&self) -> bool {
        self.quantity <= QUANTITY_EPSILON
    }

    pub fn market_value(&self) -> f64 {
        self.current_price * self.quantity
    }

    pub fn unrealized_pnl(&self) -> f64 {
        (self.current_price - self.entry_price) * self.quantity
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            symbol: self.symbol.clone(),
            side: self.side,
            quantity: self.quantity,
            entry_price: self.entry_price,
            current_price: self.current_price,
            unrealized_pnl: self.unrealized_pnl(),
            stop_loss: self.stop_loss,
        }
    }
}

/// Read-only copy of a position handed to callers outside the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub unrealized_pnl: f64,
    pub stop_loss: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    StopLoss,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

/// Closed round trip. `pnl = (exit - entry) * quantity - commission`, where
/// `commission` is the exit-side commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: OrderSide,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub pnl: f64,
    pub commission: f64,
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
