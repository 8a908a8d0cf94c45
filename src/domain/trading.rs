//! Paper/live trading loop: signals -> risk -> broker -> persistence.
//!
//! Entries are gated by the [`RiskManager`]; exits always go straight to
//! the broker. The risk manager's capital is re-read from the broker's
//! cash balance before every assessment and after every fill.

use serde::{Deserialize, Serialize};

use super::error::AlgoTraderError;
use super::execution::{OrderResult, OrderSide, OrderStatus};
use super::ohlcv::Bar;
use super::risk::RiskManager;
use super::signal::{Signal, SignalKind, SignalProducer};
use crate::ports::broker_port::Broker;
use crate::ports::persistence_port::PersistencePort;

/// Outcome of one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDetail {
    pub signal: SignalKind,
    pub symbol: String,
    pub status: OrderStatus,
    pub quantity: f64,
    pub price: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingSummary {
    pub executed: usize,
    pub rejected: usize,
    pub details: Vec<SignalDetail>,
}

impl TradingSummary {
    pub fn merge(&mut self, other: TradingSummary) {
        self.executed += other.executed;
        self.rejected += other.rejected;
        self.details.extend(other.details);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub portfolio_value: f64,
    pub cash: f64,
    pub position_value: f64,
    /// Relative to the portfolio value when the service was created.
    pub total_return_pct: f64,
    pub drawdown_pct: f64,
    pub peak_equity: f64,
    pub open_positions: usize,
    pub circuit_breaker: bool,
    pub strategy: String,
}

pub struct TradingService<B: Broker> {
    broker: B,
    risk: RiskManager,
    producer: Box<dyn SignalProducer>,
    sink: Option<Box<dyn PersistencePort>>,
    starting_equity: f64,
    peak_equity: f64,
}

impl<B: Broker> TradingService<B> {
    pub fn new(broker: B, risk: RiskManager, producer: Box<dyn SignalProducer>) -> Self {
        let equity = broker.get_portfolio_value();
        TradingService {
            broker,
            risk,
            producer,
            sink: None,
            starting_equity: equity,
            peak_equity: equity,
        }
    }

    pub fn with_persistence(mut self, sink: Box<dyn PersistencePort>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn risk_manager(&self) -> &RiskManager {
        &self.risk
    }

    pub fn peak_equity(&self) -> f64 {
        self.peak_equity
    }

    /// Manual capital override. It only holds until the next assessment
    /// or fill re-reads the broker balance.
    pub fn update_capital(&mut self, capital: f64) {
        self.risk.update_capital(capital);
    }

    /// Mark `symbol` at the last close, run the producer over `bars` and act
    /// on every signal it returns.
    pub fn process_bar(&mut self, bars: &[Bar], symbol: &str) -> TradingSummary {
        self.mark(bars, symbol);
        let signals = self.producer.generate_signals(bars, symbol);
        self.process_signals(&signals)
    }

    /// Like [`process_bar`](Self::process_bar), but only acts on signals
    /// stamped with the last bar's timestamp. Feeding a growing window one
    /// bar at a time acts on each signal exactly once.
    pub fn process_latest_bar(&mut self, bars: &[Bar], symbol: &str) -> TradingSummary {
        let Some(last) = bars.last() else {
            return TradingSummary::default();
        };
        self.mark(bars, symbol);
        let signals: Vec<Signal> = self
            .producer
            .generate_signals(bars, symbol)
            .into_iter()
            .filter(|s| s.timestamp == last.timestamp)
            .collect();
        self.process_signals(&signals)
    }

    /// A persistence failure after a fill does not undo the fill: it is
    /// logged and appended to that signal's detail message.
    pub fn process_signals(&mut self, signals: &[Signal]) -> TradingSummary {
        let mut summary = TradingSummary::default();
        for signal in signals {
            let step = match signal.kind {
                SignalKind::Hold => continue,
                SignalKind::Buy => self.handle_buy(signal),
                SignalKind::Sell => self.handle_sell(signal),
            };
            summary.merge(step);
            self.track_peak();
        }
        summary
    }

    pub fn performance(&self) -> PerformanceSnapshot {
        let portfolio_value = self.broker.get_portfolio_value();
        let positions = self.broker.get_positions();
        let position_value: f64 = positions.iter().map(|p| p.current_price * p.quantity).sum();
        let total_return_pct = if self.starting_equity > 0.0 {
            (portfolio_value - self.starting_equity) / self.starting_equity
        } else {
            0.0
        };
        let dd = self.risk.drawdown(portfolio_value, self.peak_equity);

        PerformanceSnapshot {
            portfolio_value,
            cash: self.broker.get_balance(),
            position_value,
            total_return_pct,
            drawdown_pct: dd.drawdown_pct,
            peak_equity: dd.peak_equity,
            open_positions: positions.len(),
            circuit_breaker: dd.circuit_breaker,
            strategy: self.producer.name().to_string(),
        }
    }

    fn mark(&mut self, bars: &[Bar], symbol: &str) {
        if let Some(last) = bars.last() {
            self.broker.update_price(symbol, last.close);
            self.track_peak();
        }
    }

    fn track_peak(&mut self) {
        let value = self.broker.get_portfolio_value();
        if value > self.peak_equity {
            self.peak_equity = value;
        }
        let dd = self.risk.drawdown(value, self.peak_equity);
        if dd.circuit_breaker {
            tracing::warn!(
                drawdown_pct = dd.drawdown_pct,
                peak_equity = dd.peak_equity,
                "circuit breaker drawdown exceeded"
            );
        }
    }

    fn sync_capital(&mut self) {
        self.risk.update_capital(self.broker.get_balance());
    }

    fn handle_buy(&mut self, signal: &Signal) -> TradingSummary {
        let positions = self.broker.get_positions();
        let exposure: f64 = positions.iter().map(|p| p.current_price * p.quantity).sum();

        self.sync_capital();
        let assessment = self
            .risk
            .assess(signal.price, OrderSide::Buy, exposure, positions.len());
        if !assessment.approved {
            tracing::warn!(symbol = %signal.symbol, reason = %assessment.reason, "entry rejected by risk");
            return TradingSummary {
                executed: 0,
                rejected: 1,
                details: vec![SignalDetail {
                    signal: signal.kind,
                    symbol: signal.symbol.clone(),
                    status: OrderStatus::Rejected,
                    quantity: 0.0,
                    price: signal.price,
                    message: assessment.reason,
                }],
            };
        }

        let order = self.broker.place_order(
            &signal.symbol,
            OrderSide::Buy,
            assessment.position_size,
            signal.price,
            Some(assessment.stop_loss_price),
        );
        let mut persist_error = None;
        if order.is_filled() {
            self.sync_capital();
            let strategy = self.producer.name().to_string();
            let snapshot = self
                .broker
                .get_positions()
                .into_iter()
                .find(|p| p.symbol == signal.symbol);
            persist_error = self.persist(&order, |sink| {
                sink.record_fill(&order, &strategy, 0.0)?;
                if let Some(snapshot) = &snapshot {
                    sink.upsert_position(snapshot)?;
                }
                Ok(())
            });
        }
        Self::order_summary(signal, &order, persist_error)
    }

    fn handle_sell(&mut self, signal: &Signal) -> TradingSummary {
        let entry_price = self
            .broker
            .get_positions()
            .into_iter()
            .find(|p| p.symbol == signal.symbol)
            .map(|p| p.entry_price);

        let order = self.broker.close_position(&signal.symbol, signal.price);
        let mut persist_error = None;
        if order.is_filled() {
            self.sync_capital();
            let pnl = entry_price
                .map(|entry| (order.fill_price - entry) * order.quantity - order.commission)
                .unwrap_or(0.0);
            tracing::info!(symbol = %signal.symbol, pnl, "position closed");
            let strategy = self.producer.name().to_string();
            persist_error = self.persist(&order, |sink| {
                sink.record_fill(&order, &strategy, pnl)?;
                sink.remove_position(&order.symbol)
            });
        }
        Self::order_summary(signal, &order, persist_error)
    }

    /// Run `write` against the sink, if any. Returns the failure message.
    fn persist(
        &mut self,
        order: &OrderResult,
        write: impl FnOnce(&mut Box<dyn PersistencePort>) -> Result<(), AlgoTraderError>,
    ) -> Option<String> {
        let sink = self.sink.as_mut()?;
        match write(sink) {
            Ok(()) => None,
            Err(err) => {
                tracing::error!(
                    symbol = %order.symbol,
                    order_id = %order.order_id,
                    error = %err,
                    "fill not persisted"
                );
                Some(err.to_string())
            }
        }
    }

    fn order_summary(
        signal: &Signal,
        order: &OrderResult,
        persist_error: Option<String>,
    ) -> TradingSummary {
        let filled = order.is_filled();
        if !filled {
            tracing::warn!(symbol = %order.symbol, side = %order.side, message = %order.message, "order rejected");
        }
        TradingSummary {
            executed: usize::from(filled),
            rejected: usize::from(!filled),
            details: vec![SignalDetail {
                signal: signal.kind,
                symbol: order.symbol.clone(),
                status: order.status,
                quantity: order.quantity,
                price: order.fill_price,
                message: match persist_error {
                    Some(err) => format!("{}; {err}", order.message),
                    None => order.message.clone(),
                },
            }],
        }
    }
}
