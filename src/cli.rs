//! CLI definition and dispatch.
//!
//! Every long-lived object (data source, account, risk manager, signal
//! producer, sinks) is built here and passed down explicitly.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_journal_adapter::CsvJournalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{BacktestEngine, BacktestResult};
use crate::domain::config_validation::validate_config;
use crate::domain::error::AlgoTraderError;
use crate::domain::portfolio::PaperAccount;
use crate::domain::risk::RiskManager;
use crate::domain::settings::Settings;
use crate::domain::strategy::build_producer;
use crate::domain::trading::{PerformanceSnapshot, TradingService, TradingSummary};
use crate::obs::init_tracing;
use crate::ports::data_port::DataPort;
use crate::ports::persistence_port::PersistencePort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "algotrader", about = "Backtest and paper-trade signal strategies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a strategy over historical bars
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Directory holding <SYMBOL>.csv (overrides [data] directory)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Write a JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Feed bars one at a time through the paper trading loop
    Paper {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Append fills to this CSV journal
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            symbol,
            data,
            output,
        } => run_backtest(&config, &symbol, data.as_deref(), output.as_deref()),
        Command::Paper {
            config,
            symbol,
            data,
            journal,
        } => run_paper(&config, &symbol, data.as_deref(), journal.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AlgoTraderError> {
    FileConfigAdapter::from_file(path)
}

/// Load, validate and type the configuration, then install logging.
pub fn load_settings(path: &Path) -> Result<Settings, AlgoTraderError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_config(&adapter)?;
    let settings = Settings::from_config(&adapter)?;
    init_tracing(&settings.logging)?;
    Ok(settings)
}

fn data_port(settings: &Settings, data_override: Option<&Path>) -> CsvAdapter {
    let dir = data_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&settings.data_directory));
    CsvAdapter::new(dir)
}

fn run_backtest(
    config_path: &Path,
    symbol: &str,
    data_override: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<(), AlgoTraderError> {
    let settings = load_settings(config_path)?;
    let data = data_port(&settings, data_override);
    let report = JsonReportAdapter::new();
    let report_target = output_path.map(|p| (&report as &dyn ReportPort, p));

    let result = run_backtest_pipeline(&data, &settings, symbol, report_target)?;
    print_backtest_summary(&result);
    if let Some(path) = output_path {
        eprintln!("\nReport written to: {}", path.display());
    }
    Ok(())
}

/// Fetch bars, replay the configured strategy and optionally write a report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    symbol: &str,
    report: Option<(&dyn ReportPort, &Path)>,
) -> Result<BacktestResult, AlgoTraderError> {
    let producer = build_producer(&settings.strategy)?;
    eprintln!("Loading strategy: {}", producer.name());

    let bars = data_port.fetch_bars(symbol)?;
    eprintln!("Running backtest: {} on {} bars", symbol, bars.len());

    let engine = BacktestEngine::new(settings.backtest_config());
    let result = engine.run(&bars, symbol, producer.as_ref())?;

    if let Some((port, path)) = report {
        port.write(&result, path)?;
    }
    Ok(result)
}

pub fn print_backtest_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} on {} ===", result.strategy_name, result.symbol);
    eprintln!("Period:           {} to {}", result.start_date, result.end_date);
    eprintln!("Initial Capital:  {:.2}", result.initial_capital);
    eprintln!("Final Capital:    {:.2}", result.final_capital);
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", m.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:     {:.1}%", m.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);

    if !result.trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for t in &result.trades {
            let pnl_sign = if t.pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {} -> {}  {:.4} -> {:.4}  x{:.2}  {}{:.2}  ({})",
                t.entry_time.date(),
                t.exit_time.date(),
                t.entry_price,
                t.exit_price,
                t.quantity,
                pnl_sign,
                t.pnl,
                t.exit_reason,
            );
        }
    }
}

fn run_paper(
    config_path: &Path,
    symbol: &str,
    data_override: Option<&Path>,
    journal_path: Option<&Path>,
) -> Result<(), AlgoTraderError> {
    let settings = load_settings(config_path)?;
    let data = data_port(&settings, data_override);
    let sink: Option<Box<dyn PersistencePort>> = match journal_path {
        Some(path) => Some(Box::new(CsvJournalAdapter::open(path)?)),
        None => None,
    };

    let (summary, perf) = run_paper_pipeline(&data, &settings, symbol, sink)?;
    print_paper_summary(&summary, &perf);
    Ok(())
}

/// Drive the trading loop over a growing window of bars, one bar at a time.
pub fn run_paper_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    symbol: &str,
    sink: Option<Box<dyn PersistencePort>>,
) -> Result<(TradingSummary, PerformanceSnapshot), AlgoTraderError> {
    let producer = build_producer(&settings.strategy)?;
    eprintln!("Loading strategy: {}", producer.name());

    let bars = data_port.fetch_bars(symbol)?;
    if bars.is_empty() {
        return Err(AlgoTraderError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    let account = PaperAccount::new(
        settings.account.initial_capital,
        settings.account.execution(),
    );
    let risk = RiskManager::new(settings.risk.clone(), settings.account.initial_capital);
    let mut service = TradingService::new(account, risk, producer);
    if let Some(sink) = sink {
        service = service.with_persistence(sink);
    }

    eprintln!("Paper trading {} over {} bars", symbol, bars.len());
    let mut total = TradingSummary::default();
    for end in 1..=bars.len() {
        total.merge(service.process_latest_bar(&bars[..end], symbol));
    }

    Ok((total, service.performance()))
}

pub fn print_paper_summary(summary: &TradingSummary, perf: &PerformanceSnapshot) {
    eprintln!("\n=== Paper Trading: {} ===", perf.strategy);
    for d in &summary.details {
        eprintln!(
            "  {} {} {} x{:.2} @ {:.4}  {}",
            d.signal, d.symbol, d.status, d.quantity, d.price, d.message
        );
    }
    eprintln!("Executed:         {}", summary.executed);
    eprintln!("Rejected:         {}", summary.rejected);
    eprintln!("Portfolio Value:  {:.2}", perf.portfolio_value);
    eprintln!("Cash:             {:.2}", perf.cash);
    eprintln!("Position Value:   {:.2}", perf.position_value);
    eprintln!("Total Return:     {:.2}%", perf.total_return_pct * 100.0);
    eprintln!("Drawdown:         {:.2}%", perf.drawdown_pct * 100.0);
    eprintln!("Peak Equity:      {:.2}", perf.peak_equity);
    eprintln!("Open Positions:   {}", perf.open_positions);
    if perf.circuit_breaker {
        eprintln!("WARNING: circuit breaker drawdown exceeded");
    }
}

fn run_validate(config_path: &Path) -> Result<(), AlgoTraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;
    let settings = Settings::from_config(&adapter)?;
    let producer = build_producer(&settings.strategy)?;
    eprintln!("Strategy: {}", producer.name());
    eprintln!("Config validated successfully");
    Ok(())
}
