#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Headless environments for the wildlern agents.
//!
//! The card table deals hands and judges plays, the maze board moves the agent
//! and breaks blocks. Both stand in for the game host: they produce
//! observations, execute the chosen action and report the reward. The
//! training loops tie an agent to its environment and summarise the run.

pub mod card_table;
pub mod error;
pub mod maze_board;
pub mod training;

pub use card_table::{beats, CardRewards, CardTable, Deal, HandOutcome, NoisyOracle};
pub use error::{Result, SimError};
pub use maze_board::{Cell, MazeBoard, MazeRewards, MoveOutcome, DEFAULT_LAYOUT};
pub use training::{
    run_episode, train_cards, train_maze, CardRunReport, EpisodeStats, HandTally,
    MazeRunReport,
};
