//! Moving-average crossover producer.
//!
//! Regime is +1 while SMA(short) > SMA(long), -1 otherwise. A regime flip
//! up emits BUY, a flip down emits SELL. The first bar with both averages
//! defined has no prior regime and never signals.

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::{Signal, SignalKind, SignalProducer};

#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    pub short_window: usize,
    pub long_window: usize,
    name: String,
}

impl MovingAverageCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        MovingAverageCrossover {
            short_window,
            long_window,
            name: format!("MA_Crossover({},{})", short_window, long_window),
        }
    }
}

impl SignalProducer for MovingAverageCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&self, bars: &[Bar], symbol: &str) -> Vec<Signal> {
        if bars.len() < self.long_window {
            return Vec::new();
        }

        let short = calculate_sma(bars, self.short_window);
        let long = calculate_sma(bars, self.long_window);

        let mut signals = Vec::new();
        let mut prev_regime: Option<i8> = None;

        for (i, bar) in bars.iter().enumerate() {
            let (Some(s), Some(l)) = (short.get(i), long.get(i)) else {
                continue;
            };
            let regime: i8 = if s > l { 1 } else { -1 };

            match (prev_regime, regime) {
                (Some(-1), 1) => signals.push(Signal::new(
                    SignalKind::Buy,
                    symbol,
                    bar.close,
                    bar.timestamp,
                    1.0,
                    format!(
                        "SMA{} crossed above SMA{}",
                        self.short_window, self.long_window
                    ),
                )),
                (Some(1), -1) => signals.push(Signal::new(
                    SignalKind::Sell,
                    symbol,
                    bar.close,
                    bar.timestamp,
                    1.0,
                    format!(
                        "SMA{} crossed below SMA{}",
                        self.short_window, self.long_window
                    ),
                )),
                _ => {}
            }
            prev_regime = Some(regime);
        }

        signals
    }
}
