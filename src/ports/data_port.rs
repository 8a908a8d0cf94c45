//! Bar data access port trait.

use crate::domain::error::AlgoTraderError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// Normalized bars for `symbol`, ascending with unique timestamps.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AlgoTraderError>;
}
