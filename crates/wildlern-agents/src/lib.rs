#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Tabellarische Q-Learning-Agenten für das Kartenspiel und das Labyrinth.
//!
//! Beide Agenten wählen Aktionen ε-greedy über eine dichte [`QTable`](wildlern_core::QTable),
//! deren ε linear bis auf ein Minimum abklingt. Der [`CardAgent`] lernt nur aus der
//! unmittelbaren Belohnung, der [`MazeAgent`] zusätzlich diskontiert aus dem Folgezustand.

pub mod card;
pub mod error;
pub mod exploration;
pub mod learner;
pub mod maze;
pub mod snapshot;
mod telemetry;

pub use card::{CardAgent, CardAgentConfig, CardObservation};
pub use error::{AgentError, Result};
pub use exploration::{EpsilonGreedy, EpsilonSchedule, Selection};
pub use learner::{DiscountedLearner, ImmediateLearner};
pub use maze::{MazeAgent, MazeAgentConfig, MazeObservation, MazeStep};
pub use snapshot::{AgentKind, AgentSnapshot};
