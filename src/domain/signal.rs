//! Directional signals and the producer contract.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub symbol: String,
    pub price: f64,
    pub timestamp: NaiveDateTime,
    /// Conviction in [0, 1].
    pub strength: f64,
    pub reason: String,
}

impl Signal {
    pub fn new(
        kind: SignalKind,
        symbol: &str,
        price: f64,
        timestamp: NaiveDateTime,
        strength: f64,
        reason: impl Into<String>,
    ) -> Self {
        Signal {
            kind,
            symbol: symbol.to_string(),
            price,
            timestamp,
            strength: strength.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }
}

/// Turns a normalized bar series into an ordered, finite list of signals.
///
/// Implementations receive bars already sorted with unique timestamps and
/// must not assume anything about how the signals will be acted upon.
pub trait SignalProducer {
    fn name(&self) -> &str;

    fn generate_signals(&self, bars: &[Bar], symbol: &str) -> Vec<Signal>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn strength_is_clamped() {
        let high = Signal::new(SignalKind::Buy, "X", 1.0, ts(), 3.0, "");
        let low = Signal::new(SignalKind::Sell, "X", 1.0, ts(), -0.5, "");
        assert_eq!(high.strength, 1.0);
        assert_eq!(low.strength, 0.0);
    }

    #[test]
    fn kind_display_and_serde() {
        assert_eq!(SignalKind::Buy.to_string(), "BUY");
        assert_eq!(SignalKind::Hold.to_string(), "HOLD");
        let json = serde_json::to_string(&SignalKind::Sell).unwrap();
        assert_eq!(json, "\"SELL\"");
    }
}
