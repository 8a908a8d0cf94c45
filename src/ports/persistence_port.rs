//! Durable sink for fills and open positions.
//!
//! Write-only: nothing the sink stores is ever read back into a running
//! computation.

use crate::domain::error::AlgoTraderError;
use crate::domain::execution::OrderResult;
use crate::domain::position::PositionSnapshot;

pub trait PersistencePort {
    /// Record a filled order. `pnl` is the realized gain for a SELL and 0 for a BUY.
    fn record_fill(&mut self, order: &OrderResult, strategy: &str, pnl: f64)
        -> Result<(), AlgoTraderError>;

    fn upsert_position(&mut self, position: &PositionSnapshot) -> Result<(), AlgoTraderError>;

    fn remove_position(&mut self, symbol: &str) -> Result<(), AlgoTraderError>;
}
