//! RSI mean-reversion producer.
//!
//! BUY when RSI drops through the oversold line, SELL when it rises through
//! the overbought line. Each defined RSI is compared with the previous
//! defined RSI, so undefined gaps are skipped over.

use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::{Signal, SignalKind, SignalProducer};

#[derive(Debug, Clone)]
pub struct RsiMeanReversion {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
    name: String,
}

impl RsiMeanReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        RsiMeanReversion {
            period,
            oversold,
            overbought,
            name: format!("RSI_MeanRev({},{},{})", period, oversold, overbought),
        }
    }
}

impl SignalProducer for RsiMeanReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&self, bars: &[Bar], symbol: &str) -> Vec<Signal> {
        if bars.len() < self.period + 1 {
            return Vec::new();
        }

        let rsi = calculate_rsi(bars, self.period);
        let mut signals = Vec::new();
        let mut prev: Option<f64> = None;

        for (i, bar) in bars.iter().enumerate() {
            let Some(now) = rsi.get(i) else {
                continue;
            };

            if let Some(prev) = prev {
                if prev >= self.oversold && now < self.oversold {
                    signals.push(Signal::new(
                        SignalKind::Buy,
                        symbol,
                        bar.close,
                        bar.timestamp,
                        ((self.oversold - now) / self.oversold).min(1.0),
                        format!(
                            "RSI({}) dropped below {}: {:.1}",
                            self.period, self.oversold, now
                        ),
                    ));
                } else if prev <= self.overbought && now > self.overbought {
                    signals.push(Signal::new(
                        SignalKind::Sell,
                        symbol,
                        bar.close,
                        bar.timestamp,
                        ((now - self.overbought) / (100.0 - self.overbought)).min(1.0),
                        format!(
                            "RSI({}) rose above {}: {:.1}",
                            self.period, self.overbought, now
                        ),
                    ));
                }
            }
            prev = Some(now);
        }

        signals
    }
}
