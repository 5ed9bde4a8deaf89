use thiserror::Error;

use crate::TurnPhase;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("expected {expected} features, got {got}")]
    FeatureLength { expected: usize, got: usize },
    #[error("digit {digit} at position {position} is outside radix {radix}")]
    DigitOutOfRange {
        position: usize,
        digit: usize,
        radix: usize,
    },
    #[error("invalid breakable bit string '{0}' (expected only '0' and '1')")]
    InvalidBitString(String),
    #[error("state {state} is outside [0, {num_states})")]
    StateOutOfRange { state: usize, num_states: usize },
    #[error("action {action} is outside [0, {num_actions})")]
    ActionOutOfRange { action: usize, num_actions: usize },
    #[error("Q-table shape needs {expected} values, found {found}")]
    TableShape { expected: usize, found: usize },
    #[error("position ({row}, {col}) is outside the {rows}x{cols} board")]
    PositionOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("classifier returned no scores")]
    EmptyScores,
    #[error("reward reported before any action was chosen")]
    NoPendingAction,
    #[error("turn out of order: expected {expected:?}, agent is {found:?}")]
    OutOfOrder { expected: TurnPhase, found: TurnPhase },
}

pub type Result<T> = std::result::Result<T, CoreError>;
