#![allow(dead_code)]

use algotrader::domain::error::AlgoTraderError;
use algotrader::domain::execution::OrderResult;
pub use algotrader::domain::ohlcv::Bar;
use algotrader::domain::position::PositionSnapshot;
use algotrader::ports::data_port::DataPort;
use algotrader::ports::persistence_port::PersistencePort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AlgoTraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(AlgoTraderError::Persistence {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| AlgoTraderError::NoData {
                symbol: symbol.to_string(),
            })
    }
}

/// What a [`MemorySink`] has seen. Shared so tests can inspect it after the
/// sink is boxed into a service.
#[derive(Debug, Default)]
pub struct SinkLog {
    pub fills: Vec<(OrderResult, String, f64)>,
    pub positions: HashMap<String, PositionSnapshot>,
    pub removed: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MemorySink {
    pub log: Rc<RefCell<SinkLog>>,
}

impl PersistencePort for MemorySink {
    fn record_fill(
        &mut self,
        order: &OrderResult,
        strategy: &str,
        pnl: f64,
    ) -> Result<(), AlgoTraderError> {
        self.log
            .borrow_mut()
            .fills
            .push((order.clone(), strategy.to_string(), pnl));
        Ok(())
    }

    fn upsert_position(&mut self, position: &PositionSnapshot) -> Result<(), AlgoTraderError> {
        self.log
            .borrow_mut()
            .positions
            .insert(position.symbol.clone(), position.clone());
        Ok(())
    }

    fn remove_position(&mut self, symbol: &str) -> Result<(), AlgoTraderError> {
        let mut log = self.log.borrow_mut();
        log.positions.remove(symbol);
        log.removed.push(symbol.to_string());
        Ok(())
    }
}

pub fn day(n: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(n as i64)
}

/// Daily bars, one per close, starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::from_close(day(i), c))
        .collect()
}

/// 60 closes: a slide from 110 to 100, a climb to 130, then a drop to 90.
/// With 5/20 moving averages this crosses up at bar 24 and down at bar 46.
pub fn v_shape_closes() -> Vec<f64> {
    let mut closes = Vec::with_capacity(60);
    for i in 0..20 {
        closes.push(110.0 - i as f64 * 10.0 / 19.0);
    }
    for i in 20..40 {
        closes.push(100.0 + 1.5 * (i - 19) as f64);
    }
    for i in 40..60 {
        closes.push(130.0 - 2.0 * (i - 39) as f64);
    }
    closes
}

pub fn csv_content(bars: &[Bar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.date(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
