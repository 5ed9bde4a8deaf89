#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Shared building blocks for the wildlern agents: state encoders, the dense
//! Q-table, action codecs and the perception boundary.

pub mod codec;
pub mod encoding;
pub mod error;
pub mod perception;
pub mod q_table;

pub use codec::{ActionCodec, CardActionCodec, Direction, DirectionCodec};
pub use encoding::{CardStateEncoder, MazeStateEncoder, MixedRadix};
pub use error::{CoreError, Result};
pub use perception::{argmax, Classifier};
pub use q_table::QTable;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why an action was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Why {
    Explore,
    Exploit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision<C> {
    pub state: usize,
    pub action: usize,
    pub choice: C,
    /// Q-value of `(state, action)` at decision time.
    pub score: f32,
    pub why: Why,
    /// Exploration rate that was in force for this draw.
    pub epsilon: f32,
}

/// Where an agent stands within one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    AwaitingPerception,
    Deciding,
    AwaitingReward,
}

pub trait Agent {
    type Observation;
    type Choice;
    type Outcome;
    type Error: std::error::Error;

    fn decide(
        &mut self,
        obs: &Self::Observation,
    ) -> std::result::Result<Decision<Self::Choice>, Self::Error>;
    fn feedback(&mut self, outcome: &Self::Outcome) -> std::result::Result<(), Self::Error>;
    fn snapshot(&self) -> Value;
    fn load(&mut self, snapshot: Value) -> std::result::Result<(), Self::Error>;
}
