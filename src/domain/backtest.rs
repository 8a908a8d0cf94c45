//! Bar-by-bar replay of a signal series against a paper account.
//!
//! Per bar, in order:
//! 1. stop-loss check while long (`close <= entry * (1 - stop_loss_pct)`)
//! 2. signal handling (BUY when flat, SELL when long)
//! 3. equity mark (`cash + qty * close`)
//!
//! A position still open after the last bar is closed at the last close.
//! Signals are matched to bars by exact timestamp; a signal with no
//! matching bar has no effect.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::error::AlgoTraderError;
use super::execution::{ExecutionConfig, OrderSide};
use super::metrics::Metrics;
use super::ohlcv::{sort_and_dedup, Bar};
use super::portfolio::{EquityPoint, PaperAccount};
use super::position::{ExitReason, TradeRecord};
use super::signal::{Signal, SignalKind, SignalProducer};
use super::sizing::{capped_size, replay_caps};
use crate::ports::broker_port::Broker;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
    pub risk_per_trade: f64,
    pub stop_loss_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            commission_pct: 0.001,
            slippage_pct: 0.0005,
            risk_per_trade: 0.02,
            stop_loss_pct: 0.03,
        }
    }
}

impl BacktestConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_pct: self.commission_pct,
            slippage_pct: self.slippage_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub symbol: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub metrics: Metrics,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Entry bookkeeping for the single open position.
struct OpenTrade {
    entry_price: f64,
    entry_time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        BacktestEngine { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Generate signals with `producer` and replay them.
    pub fn run(
        &self,
        bars: &[Bar],
        symbol: &str,
        producer: &dyn SignalProducer,
    ) -> Result<BacktestResult, AlgoTraderError> {
        let mut bars = bars.to_vec();
        sort_and_dedup(&mut bars);
        let signals = producer.generate_signals(&bars, symbol);
        tracing::debug!(
            strategy = producer.name(),
            symbol,
            signals = signals.len(),
            "signals generated"
        );
        self.run_with_signals(&bars, symbol, producer.name(), &signals)
    }

    /// Replay a precomputed signal list.
    pub fn run_with_signals(
        &self,
        bars: &[Bar],
        symbol: &str,
        strategy_name: &str,
        signals: &[Signal],
    ) -> Result<BacktestResult, AlgoTraderError> {
        let mut bars = bars.to_vec();
        sort_and_dedup(&mut bars);
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(AlgoTraderError::EmptySeries {
                symbol: symbol.to_string(),
            });
        };
        let (start_date, end_date) = (first.timestamp, last.timestamp);

        let bar_times: HashSet<NaiveDateTime> = bars.iter().map(|b| b.timestamp).collect();
        for s in signals.iter().filter(|s| !bar_times.contains(&s.timestamp)) {
            tracing::debug!(symbol, timestamp = %s.timestamp, kind = %s.kind, "signal has no matching bar");
        }

        // Later signals for the same timestamp replace earlier ones.
        let signal_map: HashMap<NaiveDateTime, SignalKind> = signals
            .iter()
            .filter(|s| s.symbol == symbol)
            .map(|s| (s.timestamp, s.kind))
            .collect();

        let cfg = &self.config;
        let mut account = PaperAccount::new(cfg.initial_capital, cfg.execution());
        let mut open: Option<OpenTrade> = None;
        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(bars.len());

        for bar in &bars {
            account.update_price(symbol, bar.close);

            if let Some(entry) = &open {
                let stop_price = entry.entry_price * (1.0 - cfg.stop_loss_pct);
                if bar.close <= stop_price {
                    tracing::debug!(symbol, %bar.timestamp, close = bar.close, stop_price, "stop-loss hit");
                    if let Some(trade) =
                        close_trade(&mut account, symbol, entry, bar, ExitReason::StopLoss)
                    {
                        trades.push(trade);
                        open = None;
                    }
                }
            }

            match signal_map.get(&bar.timestamp) {
                Some(SignalKind::Buy) if open.is_none() => {
                    open = self.enter(&mut account, symbol, bar);
                }
                Some(SignalKind::Sell) => {
                    if let Some(entry) = &open {
                        if let Some(trade) =
                            close_trade(&mut account, symbol, entry, bar, ExitReason::Signal)
                        {
                            trades.push(trade);
                            open = None;
                        }
                    }
                }
                _ => {}
            }

            // An entry on this bar opened at the slipped fill price.
            account.update_price(symbol, bar.close);
            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity: account.get_portfolio_value(),
            });
        }

        if let (Some(entry), Some(bar)) = (&open, bars.last()) {
            if let Some(trade) = close_trade(&mut account, symbol, entry, bar, ExitReason::EndOfData)
            {
                trades.push(trade);
            }
        }
        debug_assert!(account.position(symbol).is_none());

        let final_capital = account.cash();
        let metrics = Metrics::compute(cfg.initial_capital, final_capital, &equity_curve, &trades);

        tracing::info!(
            strategy = strategy_name,
            symbol,
            bars = bars.len(),
            trades = trades.len(),
            final_capital,
            total_return = metrics.total_return,
            "backtest complete"
        );

        Ok(BacktestResult {
            strategy_name: strategy_name.to_string(),
            symbol: symbol.to_string(),
            start_date,
            end_date,
            initial_capital: cfg.initial_capital,
            final_capital,
            metrics,
            trades,
            equity_curve,
        })
    }

    fn enter(&self, account: &mut PaperAccount, symbol: &str, bar: &Bar) -> Option<OpenTrade> {
        let cfg = &self.config;
        let buy_price = bar.close * (1.0 + cfg.slippage_pct);
        let qty = capped_size(&replay_caps(
            account.cash(),
            cfg.risk_per_trade,
            cfg.stop_loss_pct,
            buy_price,
        ));
        if qty <= 0.0 {
            return None;
        }

        let stop_loss = Some(buy_price * (1.0 - cfg.stop_loss_pct));
        let order = account.place_order(symbol, OrderSide::Buy, qty, bar.close, stop_loss);
        if !order.is_filled() {
            tracing::warn!(symbol, %bar.timestamp, message = %order.message, "entry rejected");
            return None;
        }
        Some(OpenTrade {
            entry_price: order.fill_price,
            entry_time: bar.timestamp,
        })
    }
}

fn close_trade(
    account: &mut PaperAccount,
    symbol: &str,
    entry: &OpenTrade,
    bar: &Bar,
    exit_reason: ExitReason,
) -> Option<TradeRecord> {
    let order = account.close_position(symbol, bar.close);
    if !order.is_filled() {
        return None;
    }
    let pnl = (order.fill_price - entry.entry_price) * order.quantity - order.commission;
    let return_pct = if entry.entry_price > 0.0 {
        (order.fill_price - entry.entry_price) / entry.entry_price
    } else {
        0.0
    };
    Some(TradeRecord {
        symbol: symbol.to_string(),
        side: OrderSide::Buy,
        entry_price: entry.entry_price,
        exit_price: order.fill_price,
        quantity: order.quantity,
        entry_time: entry.entry_time,
        exit_time: bar.timestamp,
        pnl,
        commission: order.commission,
        return_pct,
        exit_reason,
    })
}
