//! Performance metrics, recomputed from an equity curve and trade log.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::agent::ValuationPoint;
use super::position::{Side, TradeRecord};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub initial_capital: Decimal,
    pub final_value: Decimal,
    pub total_return_pct: f64,
    pub gain_per_day: Decimal,
    /// Worst peak-to-trough decline, as a non-positive percentage.
    pub max_drawdown_pct: f64,
    pub trade_count: usize,
    pub buys: usize,
    pub sells: usize,
    /// Annualised over daily valuation returns, zero risk-free rate.
    pub sharpe_ratio: f64,
}

impl PerformanceMetrics {
    pub fn compute(
        initial_capital: Decimal,
        curve: &[ValuationPoint],
        trades: &[TradeRecord],
    ) -> Self {
        let buys = trades.iter().filter(|t| t.side == Side::Buy).count();
        let sells = trades.len() - buys;

        let Some(last) = curve.last() else {
            return PerformanceMetrics {
                initial_capital,
                final_value: initial_capital,
                total_return_pct: 0.0,
                gain_per_day: Decimal::ZERO,
                max_drawdown_pct: 0.0,
                trade_count: trades.len(),
                buys,
                sells,
                sharpe_ratio: 0.0,
            };
        };

        let final_value = last.value;
        let gain = final_value - initial_capital;
        let total_return_pct = if initial_capital > Decimal::ZERO {
            to_f64(gain / initial_capital * Decimal::ONE_HUNDRED)
        } else {
            0.0
        };

        PerformanceMetrics {
            initial_capital,
            final_value,
            total_return_pct,
            gain_per_day: gain / Decimal::from(curve.len()),
            max_drawdown_pct: compute_max_drawdown(curve),
            trade_count: trades.len(),
            buys,
            sells,
            sharpe_ratio: compute_sharpe(curve),
        }
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// min over the curve of (value - running_peak) / running_peak × 100.
fn compute_max_drawdown(curve: &[ValuationPoint]) -> f64 {
    let mut peak: Option<Decimal> = None;
    let mut worst = 0.0_f64;

    for point in curve {
        let p = match peak {
            Some(p) if p >= point.value => p,
            _ => point.value,
        };
        peak = Some(p);
        if p > Decimal::ZERO {
            let dd = to_f64((point.value - p) / p * Decimal::ONE_HUNDRED);
            worst = worst.min(dd);
        }
    }
    worst
}

fn compute_sharpe(curve: &[ValuationPoint]) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = curve
        .windows(2)
        .map(|w| {
            let prev = to_f64(w[0].value);
            let curr = to_f64(w[1].value);
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
