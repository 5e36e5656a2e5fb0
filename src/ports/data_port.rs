//! Market data access port trait.

use crate::domain::bar::Bar;
use crate::domain::error::AgentBenchError;
use crate::domain::sentiment::SentimentSeries;

pub trait DataPort {
    /// Bars for `symbol`, sorted by date. Indicator columns the source does
    /// not carry are left empty.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AgentBenchError>;

    /// Daily sentiment for `symbol`; an empty series when none is available.
    fn fetch_sentiment(&self, symbol: &str) -> Result<SentimentSeries, AgentBenchError>;

    fn list_symbols(&self) -> Result<Vec<String>, AgentBenchError>;
}
