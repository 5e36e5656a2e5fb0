//! Domain error types.

/// Top-level error type for agentbench.
#[derive(Debug, thiserror::Error)]
pub enum AgentBenchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid strategy {strategy}: {reason}")]
    StrategyInvalid { strategy: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("state error: {reason}")]
    State { reason: String },

    #[error("run state error: {reason}")]
    RunState { reason: String },

    #[error("logging setup failed: {reason}")]
    Logging { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgentBenchError {
    pub(crate) fn strategy(strategy: &str, reason: impl Into<String>) -> Self {
        AgentBenchError::StrategyInvalid {
            strategy: strategy.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        AgentBenchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn data(reason: impl Into<String>) -> Self {
        AgentBenchError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&AgentBenchError> for std::process::ExitCode {
    fn from(err: &AgentBenchError) -> Self {
        let code: u8 = match err {
            AgentBenchError::Io(_) | AgentBenchError::Logging { .. } => 1,
            AgentBenchError::ConfigParse { .. }
            | AgentBenchError::ConfigMissing { .. }
            | AgentBenchError::ConfigInvalid { .. } => 2,
            AgentBenchError::StrategyInvalid { .. } => 3,
            AgentBenchError::Data { .. } | AgentBenchError::NoData { .. } => 4,
            AgentBenchError::State { .. } | AgentBenchError::RunState { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
