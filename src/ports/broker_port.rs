//! Order execution port trait.
//!
//! Anything that can fill orders for a single account: the in-memory
//! [`PaperAccount`](crate::domain::portfolio::PaperAccount) or a live
//! brokerage. The replay engine and the trading service only see this
//! trait.

use crate::domain::execution::{OrderResult, OrderSide};
use crate::domain::position::PositionSnapshot;

pub trait Broker {
    fn place_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        quantity: f64,
        price: f64,
        stop_loss: Option<f64>,
    ) -> OrderResult;

    /// Sell the whole open quantity of `symbol` at `price`.
    fn close_position(&mut self, symbol: &str, price: f64) -> OrderResult;

    fn get_positions(&self) -> Vec<PositionSnapshot>;

    /// Cash on hand.
    fn get_balance(&self) -> f64;

    /// Cash plus the marked value of every open position.
    fn get_portfolio_value(&self) -> f64;

    /// Mark an open position to `price`. No-op when flat.
    fn update_price(&mut self, symbol: &str, price: f64);
}
