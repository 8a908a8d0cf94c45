//! Typed settings read once from a [`ConfigPort`] at start-up.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::AlgoTraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::risk::RiskConfig;
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct AccountConfig {
    pub initial_capital: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        AccountConfig {
            initial_capital: 100_000.0,
            commission_pct: 0.001,
            slippage_pct: 0.0005,
        }
    }
}

impl AccountConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_pct: self.commission_pct,
            slippage_pct: self.slippage_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Colorized text output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            ansi: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub account: AccountConfig,
    pub risk: RiskConfig,
    pub strategy: StrategyConfig,
    pub data_directory: String,
    pub logging: LoggingConfig,
}

fn get_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, AlgoTraderError> {
    let value = config.get_int(section, key, default as i64)?;
    Ok(usize::try_from(value).unwrap_or(0))
}

impl Settings {
    /// Missing keys take their defaults; unparseable values are errors.
    /// Range checks live in
    /// [`validate_config`](crate::domain::config_validation::validate_config).
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AlgoTraderError> {
        let account_defaults = AccountConfig::default();
        let account = AccountConfig {
            initial_capital: config.get_double(
                "account",
                "initial_capital",
                account_defaults.initial_capital,
            )?,
            commission_pct: config.get_double(
                "account",
                "commission_pct",
                account_defaults.commission_pct,
            )?,
            slippage_pct: config.get_double(
                "account",
                "slippage_pct",
                account_defaults.slippage_pct,
            )?,
        };

        let r = RiskConfig::default();
        let risk = RiskConfig {
            risk_per_trade: config.get_double("risk", "risk_per_trade", r.risk_per_trade)?,
            stop_loss_pct: config.get_double("risk", "stop_loss_pct", r.stop_loss_pct)?,
            max_position_pct: config.get_double("risk", "max_position_pct", r.max_position_pct)?,
            max_open_positions: get_count(
                config,
                "risk",
                "max_open_positions",
                r.max_open_positions,
            )?,
            max_total_exposure: config.get_double(
                "risk",
                "max_total_exposure",
                r.max_total_exposure,
            )?,
            circuit_breaker_drawdown: config.get_double(
                "risk",
                "circuit_breaker_drawdown",
                r.circuit_breaker_drawdown,
            )?,
        };

        let s = StrategyConfig::default();
        let strategy = StrategyConfig {
            name: config
                .get_string("strategy", "name")
                .map(|n| n.trim().to_lowercase())
                .unwrap_or(s.name),
            short_window: get_count(config, "strategy", "short_window", s.short_window)?,
            long_window: get_count(config, "strategy", "long_window", s.long_window)?,
            rsi_period: get_count(config, "strategy", "rsi_period", s.rsi_period)?,
            oversold: config.get_double("strategy", "oversold", s.oversold)?,
            overbought: config.get_double("strategy", "overbought", s.overbought)?,
        };

        let logging = LoggingConfig {
            level: config
                .get_string("logging", "level")
                .unwrap_or_else(|| "info".to_string()),
            format: match config.get_string("logging", "format").as_deref() {
                Some(f) if f.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            ansi: config.get_bool("logging", "ansi", true)?,
        };

        Ok(Settings {
            account,
            risk,
            strategy,
            data_directory: config
                .get_string("data", "directory")
                .unwrap_or_else(|| ".".to_string()),
            logging,
        })
    }

    /// Replay parameters: account frictions plus the entry sizing inputs.
    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_capital: self.account.initial_capital,
            commission_pct: self.account.commission_pct,
            slippage_pct: self.account.slippage_pct,
            risk_per_trade: self.risk.risk_per_trade,
            stop_loss_pct: self.risk.stop_loss_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FileConfigAdapter::from_string("[account]\n").unwrap();
        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.account, AccountConfig::default());
        assert_eq!(settings.risk, RiskConfig::default());
        assert_eq!(settings.strategy, StrategyConfig::default());
        assert_eq!(settings.data_directory, ".");
        assert_eq!(settings.logging, LoggingConfig::default());
    }

    #[test]
    fn reads_every_section() {
        let config = FileConfigAdapter::from_string(
            r#"
[account]
initial_capital = 50000
commission_pct = 0.002
slippage_pct = 0

[risk]
risk_per_trade = 0.01
max_open_positions = 3

[strategy]
name = RSI_Mean_Reversion
rsi_period = 7

[data]
directory = /tmp/bars

[logging]
level = debug
format = JSON
ansi = no
"#,
        )
        .unwrap();
        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.account.initial_capital, 50_000.0);
        assert_eq!(settings.account.slippage_pct, 0.0);
        assert_eq!(settings.risk.risk_per_trade, 0.01);
        assert_eq!(settings.risk.max_open_positions, 3);
        assert_eq!(settings.risk.stop_loss_pct, 0.03);
        assert_eq!(settings.strategy.name, "rsi_mean_reversion");
        assert_eq!(settings.strategy.rsi_period, 7);
        assert_eq!(settings.data_directory, "/tmp/bars");
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert!(!settings.logging.ansi);
    }

    #[test]
    fn backtest_config_combines_account_and_risk() {
        let config =
            FileConfigAdapter::from_string("[risk]\nstop_loss_pct = 0.05\n").unwrap();
        let bt = Settings::from_config(&config).unwrap().backtest_config();
        assert_eq!(bt.initial_capital, 100_000.0);
        assert_eq!(bt.commission_pct, 0.001);
        assert_eq!(bt.stop_loss_pct, 0.05);
        assert_eq!(bt.risk_per_trade, 0.02);
    }

    #[test]
    fn negative_counts_become_zero() {
        let config =
            FileConfigAdapter::from_string("[strategy]\nshort_window = -5\n").unwrap();
        assert_eq!(Settings::from_config(&config).unwrap().strategy.short_window, 0);
    }

    #[test]
    fn unparseable_value_is_reported_with_its_key() {
        let config =
            FileConfigAdapter::from_string("[account]\nslippage_pct = half\n").unwrap();
        match Settings::from_config(&config).unwrap_err() {
            AlgoTraderError::ConfigInvalid { section, key, .. } => {
                assert_eq!(section, "account");
                assert_eq!(key, "slippage_pct");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
