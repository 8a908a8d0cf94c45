//! CSV file data adapter.
//!
//! One file per symbol, `<directory>/<SYMBOL>.csv`, with a header row.
//! Column handling is delegated to [`normalize_bars`].

use crate::domain::error::AlgoTraderError;
use crate::domain::ohlcv::{normalize_bars, Bar};
use crate::ports::data_port::DataPort;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn csv_error(e: csv::Error) -> AlgoTraderError {
    let row = e.position().map(|p| p.line() as usize).unwrap_or(0);
    AlgoTraderError::InvalidBar {
        row,
        reason: format!("CSV parse error: {e}"),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AlgoTraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AlgoTraderError::NoData {
                symbol: symbol.to_string(),
            },
            _ => AlgoTraderError::Io(e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let columns: Vec<String> = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
        }

        let bars = normalize_bars(&columns, &rows)?;
        tracing::debug!(symbol, path = %path.display(), rows = rows.len(), bars = bars.len(), "bars loaded");
        Ok(bars)
    }
}
