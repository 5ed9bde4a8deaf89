use thiserror::Error;
use wildlern_agents::AgentError;
use wildlern_core::CoreError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid maze layout: {0}")]
    InvalidLayout(String),
    #[error("invalid play: {0}")]
    InvalidPlay(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
