//! Configuration validation.
//!
//! Runs before any account or simulation state exists. Every check reads
//! through the same defaults as [`Settings::from_config`], so an absent key
//! is valid whenever its default is. Unparseable values are rejected by the
//! [`ConfigPort`] lookups themselves.
//!
//! [`Settings::from_config`]: crate::domain::settings::Settings::from_config

use crate::domain::error::AlgoTraderError;
use crate::domain::risk::RiskConfig;
use crate::domain::settings::AccountConfig;
use crate::domain::strategy::{StrategyConfig, MA_CROSSOVER, RSI_MEAN_REVERSION};
use crate::ports::config_port::ConfigPort;

/// Upper bound on `commission_pct`: a replay entry of 95% of cash plus its
/// commission must fit in cash.
pub const MAX_COMMISSION_PCT: f64 = 0.05;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), AlgoTraderError> {
    validate_account(config)?;
    validate_risk(config)?;
    validate_strategy(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> AlgoTraderError {
    AlgoTraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Fraction in (0, 1].
fn check_unit_fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), AlgoTraderError> {
    let value = config.get_double(section, key, default)?;
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(section, key, format!("{key} must be in (0, 1]")));
    }
    Ok(())
}

/// Rate in [0, 1).
fn check_rate(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), AlgoTraderError> {
    let value = config.get_double(section, key, default)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(section, key, format!("{key} must be in [0, 1)")));
    }
    Ok(())
}

fn validate_account(config: &dyn ConfigPort) -> Result<(), AlgoTraderError> {
    let d = AccountConfig::default();
    let capital = config.get_double("account", "initial_capital", d.initial_capital)?;
    if capital <= 0.0 {
        return Err(invalid(
            "account",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    let commission = config.get_double("account", "commission_pct", d.commission_pct)?;
    if !(0.0..=MAX_COMMISSION_PCT).contains(&commission) {
        return Err(invalid(
            "account",
            "commission_pct",
            format!("commission_pct must be in [0, {MAX_COMMISSION_PCT}]"),
        ));
    }
    check_rate(config, "account", "slippage_pct", d.slippage_pct)?;
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), AlgoTraderError> {
    let d = RiskConfig::default();
    check_unit_fraction(config, "risk", "risk_per_trade", d.risk_per_trade)?;
    check_unit_fraction(config, "risk", "stop_loss_pct", d.stop_loss_pct)?;
    check_unit_fraction(config, "risk", "max_position_pct", d.max_position_pct)?;
    check_unit_fraction(config, "risk", "max_total_exposure", d.max_total_exposure)?;
    check_unit_fraction(
        config,
        "risk",
        "circuit_breaker_drawdown",
        d.circuit_breaker_drawdown,
    )?;

    let max_open = config.get_int("risk", "max_open_positions", d.max_open_positions as i64)?;
    if max_open < 1 {
        return Err(invalid(
            "risk",
            "max_open_positions",
            "max_open_positions must be at least 1",
        ));
    }
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), AlgoTraderError> {
    let d = StrategyConfig::default();

    let name = config
        .get_string("strategy", "name")
        .map(|n| n.trim().to_lowercase())
        .unwrap_or(d.name);
    if name != MA_CROSSOVER && name != RSI_MEAN_REVERSION {
        return Err(invalid(
            "strategy",
            "name",
            format!("unknown strategy '{name}', expected {MA_CROSSOVER} or {RSI_MEAN_REVERSION}"),
        ));
    }

    let short = config.get_int("strategy", "short_window", d.short_window as i64)?;
    let long = config.get_int("strategy", "long_window", d.long_window as i64)?;
    if short < 1 {
        return Err(invalid(
            "strategy",
            "short_window",
            "short_window must be at least 1",
        ));
    }
    if short >= long {
        return Err(invalid(
            "strategy",
            "short_window",
            "short_window must be less than long_window",
        ));
    }

    let period = config.get_int("strategy", "rsi_period", d.rsi_period as i64)?;
    if period < 1 {
        return Err(invalid(
            "strategy",
            "rsi_period",
            "rsi_period must be at least 1",
        ));
    }

    let oversold = config.get_double("strategy", "oversold", d.oversold)?;
    let overbought = config.get_double("strategy", "overbought", d.overbought)?;
    if oversold <= 0.0 {
        return Err(invalid("strategy", "oversold", "oversold must be positive"));
    }
    if overbought >= 100.0 {
        return Err(invalid(
            "strategy",
            "overbought",
            "overbought must be below 100",
        ));
    }
    if oversold >= overbought {
        return Err(invalid(
            "strategy",
            "oversold",
            "oversold must be less than overbought",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(content: &str) -> String {
        match validate_config(&make_config(content)).unwrap_err() {
            AlgoTraderError::ConfigInvalid { key, .. } => key,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn full_valid_config_passes() {
        let config = make_config(
            r#"
[account]
initial_capital = 100000.0
commission_pct = 0.001
slippage_pct = 0.0005

[risk]
risk_per_trade = 0.02
stop_loss_pct = 0.03
max_position_pct = 0.10
max_open_positions = 10
max_total_exposure = 0.80
circuit_breaker_drawdown = 0.20

[strategy]
name = ma_crossover
short_window = 5
long_window = 20
"#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn defaults_pass() {
        assert!(validate_config(&make_config("[account]\n")).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        assert_eq!(
            invalid_key("[account]\ninitial_capital = 0\n"),
            "initial_capital"
        );
        assert_eq!(
            invalid_key("[account]\ninitial_capital = -100\n"),
            "initial_capital"
        );
    }

    #[test]
    fn commission_out_of_range_fails() {
        assert_eq!(invalid_key("[account]\ncommission_pct = -0.1\n"), "commission_pct");
        assert_eq!(invalid_key("[account]\ncommission_pct = 1.0\n"), "commission_pct");
        assert_eq!(invalid_key("[account]\ncommission_pct = 0.06\n"), "commission_pct");
        assert!(validate_config(&make_config("[account]\ncommission_pct = 0.05\n")).is_ok());
    }

    #[test]
    fn non_numeric_values_fail() {
        assert_eq!(
            invalid_key("[account]\ninitial_capital = lots\n"),
            "initial_capital"
        );
        assert_eq!(invalid_key("[strategy]\nshort_window = 2.5\n"), "short_window");
        assert_eq!(invalid_key("[risk]\nstop_loss_pct = nan\n"), "stop_loss_pct");
    }

    #[test]
    fn zero_slippage_is_allowed() {
        assert!(validate_config(&make_config("[account]\nslippage_pct = 0\n")).is_ok());
    }

    #[test]
    fn risk_fractions_must_be_in_unit_interval() {
        assert_eq!(invalid_key("[risk]\nrisk_per_trade = 0\n"), "risk_per_trade");
        assert_eq!(invalid_key("[risk]\nstop_loss_pct = 1.5\n"), "stop_loss_pct");
        assert_eq!(
            invalid_key("[risk]\nmax_total_exposure = -0.2\n"),
            "max_total_exposure"
        );
        assert!(validate_config(&make_config("[risk]\nmax_position_pct = 1.0\n")).is_ok());
    }

    #[test]
    fn max_open_positions_must_be_positive() {
        assert_eq!(
            invalid_key("[risk]\nmax_open_positions = 0\n"),
            "max_open_positions"
        );
    }

    #[test]
    fn unknown_strategy_fails() {
        assert_eq!(invalid_key("[strategy]\nname = momentum\n"), "name");
    }

    #[test]
    fn windows_must_be_ordered() {
        assert_eq!(
            invalid_key("[strategy]\nshort_window = 20\nlong_window = 20\n"),
            "short_window"
        );
        assert_eq!(invalid_key("[strategy]\nshort_window = 0\n"), "short_window");
    }

    #[test]
    fn rsi_thresholds_must_be_ordered() {
        assert_eq!(
            invalid_key("[strategy]\noversold = 70\noverbought = 30\n"),
            "oversold"
        );
        assert_eq!(invalid_key("[strategy]\noverbought = 100\n"), "overbought");
        assert_eq!(invalid_key("[strategy]\nrsi_period = 0\n"), "rsi_period");
    }
}
