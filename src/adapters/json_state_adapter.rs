//! JSON file persistence for the agent book.
//!
//! The whole book is one document. Saves go to `<file>.tmp` first and are
//! renamed over the target, so a reader sees either the previous or the
//! new snapshot.

use crate::domain::cycle::AgentBook;
use crate::domain::error::AgentBenchError;
use crate::ports::state_port::StatePort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonStateAdapter {
    path: PathBuf,
}

impl JsonStateAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl StatePort for JsonStateAdapter {
    fn load(&self) -> Result<Option<AgentBook>, AgentBenchError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let book = serde_json::from_str(&content).map_err(|e| AgentBenchError::State {
            reason: format!("corrupt state file {}: {}", self.path.display(), e),
        })?;
        Ok(Some(book))
    }

    fn save(&self, book: &AgentBook) -> Result<(), AgentBenchError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(book).map_err(|e| AgentBenchError::State {
            reason: format!("failed to serialize agent book: {}", e),
        })?;

        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AgentBenchError::State {
                reason: format!("atomic rename to {} failed: {}", self.path.display(), e),
            }
        })
    }
}
