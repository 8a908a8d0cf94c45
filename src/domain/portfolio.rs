//! Paper account: cash, open positions and the fill ledger.
//!
//! Orders fill immediately at the reference price adjusted for slippage.
//! A rejected order leaves the account untouched.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::execution::{
    apply_slippage, calculate_commission, ExecutionConfig, OrderResult, OrderSide, OrderStatus,
};
use super::position::{Position, PositionSnapshot};
use crate::ports::broker_port::Broker;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct PaperAccount {
    cash: f64,
    initial_capital: f64,
    execution: ExecutionConfig,
    positions: BTreeMap<String, Position>,
    trade_log: Vec<OrderResult>,
}

impl PaperAccount {
    pub fn new(initial_capital: f64, execution: ExecutionConfig) -> Self {
        PaperAccount {
            cash: initial_capital,
            initial_capital,
            execution,
            positions: BTreeMap::new(),
            trade_log: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn execution(&self) -> ExecutionConfig {
        self.execution
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Sum of mark price times quantity over open positions.
    pub fn exposure(&self) -> f64 {
        self.positions.values().map(Position::market_value).sum()
    }

    /// Every filled order, oldest first.
    pub fn trade_log(&self) -> &[OrderResult] {
        &self.trade_log
    }

    /// Restore starting cash and forget all positions and fills.
    pub fn reset(&mut self) {
        self.cash = self.initial_capital;
        self.positions.clear();
        self.trade_log.clear();
    }

    fn rejected(symbol: &str, side: OrderSide, fill_price: f64, message: String) -> OrderResult {
        tracing::debug!(symbol, %side, %message, "order rejected");
        OrderResult {
            order_id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            side,
            quantity: 0.0,
            fill_price,
            status: OrderStatus::Rejected,
            commission: 0.0,
            message,
        }
    }

    fn fill_buy(
        &mut self,
        symbol: &str,
        quantity: f64,
        fill_price: f64,
        stop_loss: Option<f64>,
    ) -> Result<f64, OrderResult> {
        let commission =
            calculate_commission(fill_price, quantity, self.execution.commission_pct);
        let total_cost = fill_price * quantity + commission;
        if total_cost > self.cash {
            return Err(Self::rejected(
                symbol,
                OrderSide::Buy,
                fill_price,
                format!(
                    "Insufficient funds: need {:.2}, have {:.2}",
                    total_cost, self.cash
                ),
            ));
        }

        self.cash -= total_cost;
        match self.positions.get_mut(symbol) {
            Some(pos) => pos.add(quantity, fill_price, stop_loss),
            None => {
                self.positions.insert(
                    symbol.to_string(),
                    Position::open(symbol, quantity, fill_price, stop_loss),
                );
            }
        }
        Ok(commission)
    }

    fn fill_sell(
        &mut self,
        symbol: &str,
        quantity: f64,
        fill_price: f64,
    ) -> Result<(f64, f64), OrderResult> {
        let Some(pos) = self.positions.get_mut(symbol) else {
            return Err(Self::rejected(
                symbol,
                OrderSide::Sell,
                fill_price,
                format!("No open position for {symbol}"),
            ));
        };

        let sold = pos.reduce(quantity);
        let commission = calculate_commission(fill_price, sold, self.execution.commission_pct);
        self.cash += fill_price * sold - commission;
        if pos.is_flat() {
            self.positions.remove(symbol);
        }
        Ok((sold, commission))
    }
}

impl Broker for PaperAccount {
    fn place_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        quantity: f64,
        price: f64,
        stop_loss: Option<f64>,
    ) -> OrderResult {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Self::rejected(symbol, side, price, format!("Invalid quantity: {quantity}"));
        }
        if !(price.is_finite() && price > 0.0) {
            return Self::rejected(symbol, side, price, format!("Invalid price: {price}"));
        }
        let fill_price = apply_slippage(price, side, self.execution.slippage_pct);

        let outcome = match side {
            OrderSide::Buy => self
                .fill_buy(symbol, quantity, fill_price, stop_loss)
                .map(|commission| (quantity, commission)),
            OrderSide::Sell => self.fill_sell(symbol, quantity, fill_price),
        };

        let (filled, commission) = match outcome {
            Ok(filled) => filled,
            Err(rejection) => return rejection,
        };

        let result = OrderResult {
            order_id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            side,
            quantity: filled,
            fill_price,
            status: OrderStatus::Filled,
            commission,
            message: "Order filled".to_string(),
        };
        tracing::debug!(
            symbol,
            %side,
            quantity = filled,
            fill_price,
            commission,
            cash = self.cash,
            "order filled"
        );
        self.trade_log.push(result.clone());
        result
    }

    fn close_position(&mut self, symbol: &str, price: f64) -> OrderResult {
        match self.positions.get(symbol).map(|p| p.quantity) {
            Some(quantity) => self.place_order(symbol, OrderSide::Sell, quantity, price, None),
            None => Self::rejected(
                symbol,
                OrderSide::Sell,
                price,
                format!("No open position for {symbol}"),
            ),
        }
    }

    fn get_positions(&self) -> Vec<PositionSnapshot> {
        self.positions.values().map(Position::snapshot).collect()
    }

    fn get_balance(&self) -> f64 {
        self.cash
    }

    fn get_portfolio_value(&self) -> f64 {
        self.cash + self.exposure()
    }

    fn update_price(&mut self, symbol: &str, price: f64) {
        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.current_price = price;
        }
    }
}
