//! Capped position sizing.
//!
//! A size is the smallest of several candidate quantities, each expressed
//! as `numerator / denominator`. Callers choose their own cap set:
//!
//! - replay: `[risk / stop_distance, 0.95 * capital / buy_price]`
//! - live:   `[risk / stop_distance, max_position_pct * capital / price,
//!            (max_total_exposure * capital - exposure) / price]`
//!
//! The two sets differ on purpose and must stay separate.

/// Share of running capital a single replay entry may consume.
pub const REPLAY_CAPITAL_CAP: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeCap {
    pub numerator: f64,
    pub denominator: f64,
}

impl SizeCap {
    pub fn new(numerator: f64, denominator: f64) -> Self {
        SizeCap {
            numerator,
            denominator,
        }
    }

    fn quantity(&self) -> Option<f64> {
        if self.denominator > 0.0 && self.numerator.is_finite() {
            Some(self.numerator / self.denominator)
        } else {
            None
        }
    }
}

/// Minimum of `numerator / denominator` over all caps, floored at 0.
///
/// The size is 0 when `caps` is empty or when any single cap has a
/// non-positive denominator or a non-finite numerator: a degenerate stop
/// distance or price vetoes the whole entry.
pub fn capped_size(caps: &[SizeCap]) -> f64 {
    caps.iter()
        .map(SizeCap::quantity)
        .try_fold(f64::INFINITY, |acc, q| q.map(|q| acc.min(q)))
        .filter(|size| size.is_finite())
        .unwrap_or(0.0)
        .max(0.0)
}

/// Cap set used by the replay engine.
pub fn replay_caps(capital: f64, risk_per_trade: f64, stop_loss_pct: f64, buy_price: f64) -> [SizeCap; 2] {
    [
        SizeCap::new(capital * risk_per_trade, buy_price * stop_loss_pct),
        SizeCap::new(capital * REPLAY_CAPITAL_CAP, buy_price),
    ]
}
