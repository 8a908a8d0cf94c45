//! Risk sizing and exposure limits.
//!
//! [`RiskManager`] is stateless apart from the capital figure it sizes
//! against. Checks run in a fixed order and the first failure wins:
//! invalid price, open-position count, total exposure. An approved trade
//! is sized by [`capped_size`] over the full live cap set.

use serde::{Deserialize, Serialize};

use super::execution::OrderSide;
use super::sizing::{capped_size, SizeCap};

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub risk_per_trade: f64,
    pub stop_loss_pct: f64,
    pub max_position_pct: f64,
    pub max_open_positions: usize,
    pub max_total_exposure: f64,
    pub circuit_breaker_drawdown: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            risk_per_trade: 0.02,
            stop_loss_pct: 0.03,
            max_position_pct: 0.10,
            max_open_positions: 10,
            max_total_exposure: 0.80,
            circuit_breaker_drawdown: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub approved: bool,
    pub position_size: f64,
    pub stop_loss_price: f64,
    pub risk_amount: f64,
    pub reason: String,
}

impl RiskAssessment {
    fn reject(reason: impl Into<String>) -> Self {
        RiskAssessment {
            approved: false,
            position_size: 0.0,
            stop_loss_price: 0.0,
            risk_amount: 0.0,
            reason: reason.into(),
        }
    }
}

/// Advisory drawdown report; nothing here blocks trading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownReport {
    pub current_equity: f64,
    pub peak_equity: f64,
    pub drawdown_pct: f64,
    pub circuit_breaker: bool,
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    capital: f64,
}

impl RiskManager {
    pub fn new(config: RiskConfig, capital: f64) -> Self {
        RiskManager { config, capital }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn update_capital(&mut self, new_capital: f64) {
        self.capital = new_capital;
    }

    pub fn assess(
        &self,
        price: f64,
        side: OrderSide,
        current_exposure: f64,
        open_position_count: usize,
    ) -> RiskAssessment {
        let cfg = &self.config;

        if price <= 0.0 {
            return RiskAssessment::reject("Invalid price");
        }

        if open_position_count >= cfg.max_open_positions {
            return RiskAssessment::reject(format!(
                "Max open positions reached ({})",
                cfg.max_open_positions
            ));
        }

        let exposure_ratio = if self.capital > 0.0 {
            current_exposure / self.capital
        } else {
            1.0
        };
        if exposure_ratio >= cfg.max_total_exposure {
            return RiskAssessment::reject(format!(
                "Total exposure {:.1}% exceeds limit {:.1}%",
                exposure_ratio * 100.0,
                cfg.max_total_exposure * 100.0
            ));
        }

        let risk_amount = self.capital * cfg.risk_per_trade;
        let position_size = capped_size(&[
            SizeCap::new(risk_amount, price * cfg.stop_loss_pct),
            SizeCap::new(self.capital * cfg.max_position_pct, price),
            SizeCap::new(cfg.max_total_exposure * self.capital - current_exposure, price),
        ]);

        if position_size <= 0.0 {
            return RiskAssessment::reject("Computed position size is zero");
        }

        let stop_loss_price = match side {
            OrderSide::Buy => price * (1.0 - cfg.stop_loss_pct),
            OrderSide::Sell => price * (1.0 + cfg.stop_loss_pct),
        };

        RiskAssessment {
            approved: true,
            position_size,
            stop_loss_price,
            risk_amount,
            reason: "Trade approved".to_string(),
        }
    }

    /// Drawdown of the tracked capital against `peak_equity`.
    pub fn check_drawdown(&self, peak_equity: f64) -> DrawdownReport {
        self.drawdown(self.capital, peak_equity)
    }

    /// `dd = (current - peak) / peak`; the breaker trips when dd falls
    /// below the negative threshold.
    pub fn drawdown(&self, current_equity: f64, peak_equity: f64) -> DrawdownReport {
        let drawdown_pct = if peak_equity > 0.0 {
            (current_equity - peak_equity) / peak_equity
        } else {
            0.0
        };
        DrawdownReport {
            current_equity,
            peak_equity,
            drawdown_pct,
            circuit_breaker: drawdown_pct < -self.config.circuit_breaker_drawdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn manager() -> RiskManager {
        RiskManager::new(RiskConfig::default(), 100_000.0)
    }

    #[test]
    fn rejects_non_positive_price() {
        let a = manager().assess(0.0, OrderSide::Buy, 0.0, 0);
        assert!(!a.approved);
        assert_eq!(a.reason, "Invalid price");
        assert_eq!(a.position_size, 0.0);
    }

    #[test]
    fn rejects_at_max_open_positions() {
        let a = manager().assess(100.0, OrderSide::Buy, 0.0, 10);
        assert!(!a.approved);
        assert_eq!(a.reason, "Max open positions reached (10)");
    }

    #[test]
    fn price_check_precedes_position_count() {
        let a = manager().assess(-1.0, OrderSide::Buy, 0.0, 50);
        assert_eq!(a.reason, "Invalid price");
    }

    #[test]
    fn rejects_exposure_over_limit() {
        let a = manager().assess(100.0, OrderSide::Buy, 85_000.0, 0);
        assert!(!a.approved);
        assert!(a.reason.contains("exposure"), "{}", a.reason);
        assert_eq!(a.reason, "Total exposure 85.0% exceeds limit 80.0%");
    }

    #[test]
    fn rejects_exposure_exactly_at_limit() {
        let a = manager().assess(100.0, OrderSide::Buy, 80_000.0, 0);
        assert!(!a.approved);
    }

    #[test]
    fn zero_capital_counts_as_full_exposure() {
        let rm = RiskManager::new(RiskConfig::default(), 0.0);
        let a = rm.assess(100.0, OrderSide::Buy, 0.0, 0);
        assert!(!a.approved);
        assert!(a.reason.starts_with("Total exposure"));
    }

    #[test]
    fn position_cap_binds() {
        // risk-based: 2000 / 3 = 666.67; position cap: 10000 / 100 = 100
        let a = manager().assess(100.0, OrderSide::Buy, 0.0, 0);
        assert!(a.approved);
        assert_eq!(a.reason, "Trade approved");
        assert_relative_eq!(a.position_size, 100.0, epsilon = 1e-9);
        assert_relative_eq!(a.stop_loss_price, 97.0, epsilon = 1e-9);
        assert_relative_eq!(a.risk_amount, 2000.0, epsilon = 1e-9);
    }

    #[test]
    fn risk_cap_binds() {
        let rm = RiskManager::new(
            RiskConfig {
                stop_loss_pct: 0.5,
                ..Default::default()
            },
            100_000.0,
        );
        // risk-based: 2000 / 50 = 40; position cap 100
        let a = rm.assess(100.0, OrderSide::Buy, 0.0, 0);
        assert_relative_eq!(a.position_size, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn remaining_exposure_cap_binds() {
        // remaining = 80000 - 75000 = 5000 -> 50 units
        let a = manager().assess(100.0, OrderSide::Buy, 75_000.0, 0);
        assert!(a.approved);
        assert_relative_eq!(a.position_size, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn sell_side_stop_is_above_price() {
        let a = manager().assess(100.0, OrderSide::Sell, 0.0, 0);
        assert_relative_eq!(a.stop_loss_price, 103.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_size_is_rejected() {
        let rm = RiskManager::new(
            RiskConfig {
                risk_per_trade: 0.0,
                ..Default::default()
            },
            100_000.0,
        );
        let a = rm.assess(100.0, OrderSide::Buy, 0.0, 0);
        assert!(!a.approved);
        assert_eq!(a.reason, "Computed position size is zero");
    }

    #[test]
    fn update_capital_changes_sizing() {
        let mut rm = manager();
        rm.update_capital(50_000.0);
        assert_eq!(rm.capital(), 50_000.0);
        let a = rm.assess(100.0, OrderSide::Buy, 0.0, 0);
        assert_relative_eq!(a.position_size, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn drawdown_report() {
        let mut rm = manager();
        rm.update_capital(90_000.0);
        let dd = rm.check_drawdown(100_000.0);
        assert_relative_eq!(dd.drawdown_pct, -0.10, epsilon = 1e-12);
        assert!(!dd.circuit_breaker);

        rm.update_capital(79_000.0);
        assert!(rm.check_drawdown(100_000.0).circuit_breaker);
    }

    #[test]
    fn drawdown_exactly_at_threshold_does_not_trip() {
        let mut rm = manager();
        rm.update_capital(80_000.0);
        assert!(!rm.check_drawdown(100_000.0).circuit_breaker);
    }

    #[test]
    fn drawdown_without_peak() {
        let dd = manager().check_drawdown(0.0);
        assert_eq!(dd.drawdown_pct, 0.0);
        assert!(!dd.circuit_breaker);
    }
}
