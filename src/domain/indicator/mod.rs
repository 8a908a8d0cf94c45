//! Technical indicators used by the built-in signal producers.
//!
//! Every indicator returns an [`IndicatorSeries`] aligned index-for-index
//! with the input bars; `None` marks warmup or undefined points.

pub mod rsi;
pub mod sma;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorType::Rsi(14).to_string(), "RSI(14)");
    }

    #[test]
    fn series_get_flattens_warmup() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![None, Some(1.5)],
        };
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), Some(1.5));
        assert_eq!(series.get(5), None);
        assert_eq!(series.valid_count(), 1);
    }
}
