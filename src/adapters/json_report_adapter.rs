//! JSON backtest report writer.
//!
//! Money is rounded to 2 decimal places, prices to 4, ratios to 4,
//! quantities to 6. The in-memory result keeps full precision.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::AlgoTraderError;
use crate::domain::position::TradeRecord;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        JsonReportAdapter
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn trade_json(t: &TradeRecord) -> Value {
    json!({
        "symbol": t.symbol,
        "side": t.side,
        "entry_price": round_to(t.entry_price, 4),
        "exit_price": round_to(t.exit_price, 4),
        "quantity": round_to(t.quantity, 6),
        "entry_time": t.entry_time.to_string(),
        "exit_time": t.exit_time.to_string(),
        "pnl": round_to(t.pnl, 2),
        "commission": round_to(t.commission, 2),
        "return_pct": round_to(t.return_pct, 6),
        "exit_reason": t.exit_reason,
    })
}

/// Report document for `result`.
pub fn report_json(result: &BacktestResult) -> Value {
    let m = &result.metrics;
    json!({
        "strategy_name": result.strategy_name,
        "symbol": result.symbol,
        "start_date": result.start_date.to_string(),
        "end_date": result.end_date.to_string(),
        "initial_capital": round_to(result.initial_capital, 2),
        "final_capital": round_to(result.final_capital, 2),
        "total_return_pct": round_to(m.total_return, 4),
        "annualized_return_pct": round_to(m.annualized_return, 4),
        "sharpe_ratio": round_to(m.sharpe_ratio, 4),
        "max_drawdown_pct": round_to(m.max_drawdown, 4),
        "total_trades": m.total_trades,
        "winning_trades": m.winning_trades,
        "losing_trades": m.losing_trades,
        "win_rate": round_to(m.win_rate, 4),
        "avg_win": round_to(m.avg_win, 2),
        "avg_loss": round_to(m.avg_loss, 2),
        "largest_win": round_to(m.largest_win, 2),
        "largest_loss": round_to(m.largest_loss, 2),
        "profit_factor": round_to(m.profit_factor, 4),
        "trades": result.trades.iter().map(trade_json).collect::<Vec<_>>(),
        "equity_curve": result
            .equity_curve
            .iter()
            .map(|p| json!({ "date": p.timestamp.to_string(), "equity": round_to(p.equity, 2) }))
            .collect::<Vec<_>>(),
    })
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), AlgoTraderError> {
        let body = serde_json::to_string_pretty(&report_json(result)).map_err(|e| {
            AlgoTraderError::Report {
                reason: format!("failed to serialize report: {e}"),
            }
        })?;
        fs::write(output_path, body).map_err(|e| AlgoTraderError::Report {
            reason: format!("failed to write {}: {e}", output_path.display()),
        })?;
        tracing::info!(path = %output_path.display(), "report written");
        Ok(())
    }
}
