//! CSV report adapter: trade log and equity curve per agent, plus one
//! metrics table across agents.

use crate::domain::backtest::AgentRun;
use crate::domain::error::AgentBenchError;
use crate::ports::report_port::ReportPort;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

#[derive(Serialize)]
struct MetricsRow<'a> {
    agent: &'a str,
    strategy: &'a str,
    initial_capital: Decimal,
    final_value: Decimal,
    total_return_pct: String,
    gain_per_day: Decimal,
    max_drawdown_pct: String,
    trades: usize,
    buys: usize,
    sells: usize,
    rejected_orders: u64,
    sharpe_ratio: String,
}

impl CsvReportAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn write_rows<T, I>(&self, file: &str, rows: I) -> Result<PathBuf, AgentBenchError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let path = self.output_dir.join(file);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| report_error(&path, e))?;
        for row in rows {
            writer.serialize(row).map_err(|e| report_error(&path, e))?;
        }
        writer.flush()?;
        Ok(path)
    }
}

fn report_error(path: &Path, err: csv::Error) -> AgentBenchError {
    AgentBenchError::data(format!("failed to write {}: {}", path.display(), err))
}

/// Keeps agent names usable as file name stems.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, runs: &[AgentRun]) -> Result<(), AgentBenchError> {
        fs::create_dir_all(&self.output_dir)?;

        for run in runs {
            let stem = file_stem(&run.agent.name);
            self.write_rows(&format!("{}_trades.csv", stem), &run.agent.trades)?;
            self.write_rows(&format!("{}_equity.csv", stem), &run.equity_curve)?;
        }

        let metrics: Vec<_> = runs.iter().map(|run| (run, run.metrics())).collect();
        let rows = metrics.iter().map(|(run, m)| MetricsRow {
            agent: &run.agent.name,
            strategy: &run.agent.config.name,
            initial_capital: m.initial_capital,
            final_value: m.final_value,
            total_return_pct: format!("{:.4}", m.total_return_pct),
            gain_per_day: m.gain_per_day.round_dp(4),
            max_drawdown_pct: format!("{:.4}", m.max_drawdown_pct),
            trades: m.trade_count,
            buys: m.buys,
            sells: m.sells,
            rejected_orders: run.agent.rejected_orders,
            sharpe_ratio: format!("{:.4}", m.sharpe_ratio),
        });
        let path = self.write_rows("metrics.csv", rows)?;
        tracing::info!(path = %path.display(), agents = runs.len(), "report written");
        Ok(())
    }
}
