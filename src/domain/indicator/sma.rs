//! Simple moving average over closing prices.
//!
//! Warmup: the first `period - 1` points are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;

pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    if period == 0 {
        values.resize(bars.len(), None);
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values,
        };
    }

    let mut window_sum = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.close;
        if i >= period {
            window_sum -= bars[i - period].close;
        }
        if i + 1 >= period {
            values.push(Some(window_sum / period as f64));
        } else {
            values.push(None);
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
