//! Signal producer configuration and construction.

pub mod ma_crossover;
pub mod rsi_reversion;

use crate::domain::error::AlgoTraderError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::{Signal, SignalProducer};

pub use ma_crossover::MovingAverageCrossover;
pub use rsi_reversion::RsiMeanReversion;

pub const MA_CROSSOVER: &str = "ma_crossover";
pub const RSI_MEAN_REVERSION: &str = "rsi_mean_reversion";

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            name: MA_CROSSOVER.to_string(),
            short_window: 10,
            long_window: 50,
            rsi_period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

pub fn build_producer(config: &StrategyConfig) -> Result<Box<dyn SignalProducer>, AlgoTraderError> {
    match config.name.trim().to_lowercase().as_str() {
        MA_CROSSOVER => Ok(Box::new(MovingAverageCrossover::new(
            config.short_window,
            config.long_window,
        ))),
        RSI_MEAN_REVERSION => Ok(Box::new(RsiMeanReversion::new(
            config.rsi_period,
            config.oversold,
            config.overbought,
        ))),
        _ => Err(AlgoTraderError::UnknownStrategy {
            name: config.name.clone(),
        }),
    }
}

/// Replays a precomputed signal list, ignoring the bars.
#[derive(Debug, Clone)]
pub struct FixedSignals {
    name: String,
    signals: Vec<Signal>,
}

impl FixedSignals {
    pub fn new(name: impl Into<String>, signals: Vec<Signal>) -> Self {
        FixedSignals {
            name: name.into(),
            signals,
        }
    }
}

impl SignalProducer for FixedSignals {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&self, _bars: &[Bar], symbol: &str) -> Vec<Signal> {
        self.signals
            .iter()
            .filter(|s| s.symbol == symbol)
            .cloned()
            .collect()
    }
}
