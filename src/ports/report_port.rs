//! Report generation port trait.

use crate::domain::backtest::AgentRun;
use crate::domain::error::AgentBenchError;

/// Port for writing backtest artifacts.
pub trait ReportPort {
    fn write(&self, runs: &[AgentRun]) -> Result<(), AgentBenchError>;
}
