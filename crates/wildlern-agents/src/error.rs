use thiserror::Error;
use wildlern_core::CoreError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Snapshot deserialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Snapshot does not fit this agent: {0}")]
    SnapshotMismatch(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("No current state to act from")]
    NoCurrentState,
}

pub type Result<T> = std::result::Result<T, AgentError>;
