//! RSI (Relative Strength Index).
//!
//! Average gain/loss use exponential smoothing with alpha = 1/period,
//! seeded with the first price change:
//! - avg_1 = change_1
//! - avg_t = avg_{t-1} * (1 - alpha) + change_t * alpha
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//!
//! Warmup: defined from bar `period` on (needs `period` price changes).
//! Undefined whenever avg_loss == 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    let mut values = vec![None; bars.len()];

    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values,
        };
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i == 1 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = avg_gain * (1.0 - alpha) + gain * alpha;
            avg_loss = avg_loss * (1.0 - alpha) + loss * alpha;
        }

        if i >= period && avg_loss > 0.0 {
            values[i] = Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
