//! Domain error types.
//!
//! Order rejections and degenerate statistics are not errors: they are
//! reported through `OrderResult`, `RiskAssessment` and sentinel metric
//! values. Everything here aborts the operation before any account state
//! is touched.

/// Top-level error type for algotrader.
#[derive(Debug, thiserror::Error)]
pub enum AlgoTraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("bar data missing columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("invalid bar at row {row}: {reason}")]
    InvalidBar { row: usize, reason: String },

    #[error("no usable bars for {symbol}")]
    EmptySeries { symbol: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AlgoTraderError> for std::process::ExitCode {
    fn from(err: &AlgoTraderError) -> Self {
        let code: u8 = match err {
            AlgoTraderError::Io(_) | AlgoTraderError::Report { .. } => 1,
            AlgoTraderError::ConfigParse { .. } | AlgoTraderError::ConfigInvalid { .. } => 2,
            AlgoTraderError::Persistence { .. } => 3,
            AlgoTraderError::UnknownStrategy { .. } => 4,
            AlgoTraderError::MissingColumns { .. }
            | AlgoTraderError::InvalidBar { .. }
            | AlgoTraderError::EmptySeries { .. }
            | AlgoTraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
