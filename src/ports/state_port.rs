//! Agent-book persistence port trait.

use crate::domain::cycle::AgentBook;
use crate::domain::error::AgentBenchError;

pub trait StatePort {
    /// The stored book, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<AgentBook>, AgentBenchError>;

    /// Replaces the stored book in one step: readers see the old or the new
    /// book, never a mix.
    fn save(&self, book: &AgentBook) -> Result<(), AgentBenchError>;
}
