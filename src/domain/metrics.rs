//! Performance statistics computed once after a replay.
//!
//! Degenerate inputs never fail: an empty ledger, a flat curve or a
//! single bar all resolve to fixed sentinel values.

use serde::{Deserialize, Serialize};

use super::portfolio::EquityPoint;
use super::position::TradeRecord;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Profit factor reported when no trade lost money.
pub const PROFIT_FACTOR_NO_LOSSES: f64 = 9999.99;

/// Floor on the annualization horizon, in years.
const MIN_YEARS: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    /// Non-positive fraction; 0 when equity never fell below its peak.
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    /// Mean magnitude of losing trades.
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Metrics {
    pub fn compute(
        initial_capital: f64,
        final_capital: f64,
        equity_curve: &[EquityPoint],
        trades: &[TradeRecord],
    ) -> Self {
        let total_return = if initial_capital > 0.0 {
            (final_capital - initial_capital) / initial_capital
        } else {
            0.0
        };

        let equities: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let (annualized_return, sharpe_ratio, max_drawdown) = if equities.len() > 1 {
            (
                annualize(total_return, equities.len()),
                compute_sharpe(&daily_returns(&equities)),
                compute_max_drawdown(&equities),
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            if trade.is_win() {
                winning_trades += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else {
                // Breakeven trades count as losses.
                losing_trades += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else {
            PROFIT_FACTOR_NO_LOSSES
        };

        let avg_win = if winning_trades > 0 {
            total_wins / winning_trades as f64
        } else {
            0.0
        };

        let avg_loss = if losing_trades > 0 {
            total_losses / losing_trades as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
        }
    }
}

/// `(1 + r)^(1 / years) - 1`, one curve point per trading day.
fn annualize(total_return: f64, points: usize) -> f64 {
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    let years = (points as f64 / TRADING_DAYS_PER_YEAR).max(MIN_YEARS);
    growth.powf(1.0 / years) - 1.0
}

/// Percent change between consecutive points. Steps from a non-positive
/// equity are skipped.
fn daily_returns(equities: &[f64]) -> Vec<f64> {
    equities
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Annualized Sharpe with sample standard deviation; 0 when undefined.
fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev > 0.0 {
        mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

fn compute_max_drawdown(equities: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &equity in equities {
        peak = peak.max(equity);
        if peak > 0.0 {
            max_dd = max_dd.min((equity - peak) / peak);
        }
    }
    max_dd
}
