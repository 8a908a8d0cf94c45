//! CSV fill journal.
//!
//! Appends one row per filled order and keeps the latest snapshot of
//! every open position in memory.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::domain::error::AlgoTraderError;
use crate::domain::execution::OrderResult;
use crate::domain::position::PositionSnapshot;
use crate::ports::persistence_port::PersistencePort;

pub const JOURNAL_HEADER: [&str; 9] = [
    "order_id",
    "symbol",
    "side",
    "quantity",
    "price",
    "commission",
    "pnl",
    "status",
    "strategy",
];

pub struct CsvJournalAdapter {
    path: PathBuf,
    positions: BTreeMap<String, PositionSnapshot>,
}

fn persistence_error(path: &Path, e: impl std::fmt::Display) -> AlgoTraderError {
    AlgoTraderError::Persistence {
        reason: format!("{}: {e}", path.display()),
    }
}

impl CsvJournalAdapter {
    /// Open (or create) the journal at `path`. A header row is written when
    /// the file is new or empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AlgoTraderError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| persistence_error(&path, e))?;
        let is_empty = file
            .metadata()
            .map_err(|e| persistence_error(&path, e))?
            .len()
            == 0;
        if is_empty {
            let mut wtr = csv::Writer::from_writer(file);
            wtr.write_record(JOURNAL_HEADER)
                .map_err(|e| persistence_error(&path, e))?;
            wtr.flush().map_err(|e| persistence_error(&path, e))?;
        }
        Ok(CsvJournalAdapter {
            path,
            positions: BTreeMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest snapshot of every position still open.
    pub fn positions(&self) -> impl Iterator<Item = &PositionSnapshot> {
        self.positions.values()
    }
}

impl PersistencePort for CsvJournalAdapter {
    fn record_fill(
        &mut self,
        order: &OrderResult,
        strategy: &str,
        pnl: f64,
    ) -> Result<(), AlgoTraderError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| persistence_error(&self.path, e))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record([
            order.order_id.clone(),
            order.symbol.clone(),
            order.side.to_string(),
            format!("{:.6}", order.quantity),
            format!("{:.4}", order.fill_price),
            format!("{:.4}", order.commission),
            format!("{:.2}", pnl),
            order.status.to_string(),
            strategy.to_string(),
        ])
        .map_err(|e| persistence_error(&self.path, e))?;
        wtr.flush().map_err(|e| persistence_error(&self.path, e))?;
        Ok(())
    }

    fn upsert_position(&mut self, position: &PositionSnapshot) -> Result<(), AlgoTraderError> {
        self.positions
            .insert(position.symbol.clone(), position.clone());
        Ok(())
    }

    fn remove_position(&mut self, symbol: &str) -> Result<(), AlgoTraderError> {
        self.positions.remove(symbol);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{OrderSide, OrderStatus};
    use tempfile::TempDir;

    fn order(side: OrderSide) -> OrderResult {
        OrderResult {
            order_id: "abc".into(),
            symbol: "BHP".into(),
            side,
            quantity: 10.0,
            fill_price: 100.05,
            status: OrderStatus::Filled,
            commission: 1.0005,
            message: "Order filled".into(),
        }
    }

    fn snapshot(qty: f64) -> PositionSnapshot {
        PositionSnapshot {
            symbol: "BHP".into(),
            side: OrderSide::Buy,
            quantity: qty,
            entry_price: 100.05,
            current_price: 100.05,
            unrealized_pnl: 0.0,
            stop_loss: Some(97.0),
        }
    }

    #[test]
    fn appends_rows_after_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.csv");
        let mut journal = CsvJournalAdapter::open(&path).unwrap();
        journal.record_fill(&order(OrderSide::Buy), "ma", 0.0).unwrap();
        journal.record_fill(&order(OrderSide::Sell), "ma", 12.5).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), JOURNAL_HEADER.to_vec());
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "BUY");
        assert_eq!(&rows[1][2], "SELL");
        assert_eq!(&rows[1][6], "12.50");
        assert_eq!(&rows[1][8], "ma");
    }

    #[test]
    fn reopening_does_not_repeat_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.csv");
        CsvJournalAdapter::open(&path)
            .unwrap()
            .record_fill(&order(OrderSide::Buy), "ma", 0.0)
            .unwrap();
        CsvJournalAdapter::open(&path)
            .unwrap()
            .record_fill(&order(OrderSide::Sell), "ma", 1.0)
            .unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(rdr.records().count(), 2);
    }

    #[test]
    fn tracks_latest_position_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut journal = CsvJournalAdapter::open(dir.path().join("j.csv")).unwrap();
        journal.upsert_position(&snapshot(10.0)).unwrap();
        journal.upsert_position(&snapshot(20.0)).unwrap();
        let open: Vec<&PositionSnapshot> = journal.positions().collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].quantity, 20.0);
        journal.remove_position("BHP").unwrap();
        assert_eq!(journal.positions().count(), 0);
    }

    #[test]
    fn unopenable_path_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let err = CsvJournalAdapter::open(dir.path().join("nope").join("j.csv"))
            .err()
            .unwrap();
        assert!(matches!(err, AlgoTraderError::Persistence { .. }));
    }
}
