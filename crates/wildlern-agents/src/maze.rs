//! Agent for the grid maze.
//!
//! The state is the agent's cell plus which breakable blocks are still intact.
//! Episodes are sequential, so updates bootstrap off the next state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wildlern_core::{
    ActionCodec, Agent, CoreError, Decision, Direction, DirectionCodec, MazeStateEncoder, QTable,
    TurnPhase,
};

use crate::error::{AgentError, Result};
use crate::exploration::{EpsilonGreedy, EpsilonSchedule};
use crate::learner::DiscountedLearner;
use crate::snapshot::{AgentKind, AgentSnapshot};
use crate::telemetry;

const AGENT: &str = "maze";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeAgentConfig {
    pub rows: usize,
    pub cols: usize,
    pub breakables: usize,
    pub learning_rate: f32,
    pub gamma: f32,
    pub exploration: EpsilonSchedule,
}

impl Default for MazeAgentConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            breakables: 4,
            learning_rate: 0.5,
            gamma: 0.99,
            exploration: EpsilonSchedule {
                start: 1.0,
                min: 0.1,
                cooling_steps: 100,
            },
        }
    }
}

impl MazeAgentConfig {
    pub fn validate(&self) -> Result<()> {
        MazeStateEncoder::new(self.rows, self.cols, self.breakables)?;
        self.exploration.validate()?;
        DiscountedLearner::new(self.learning_rate, self.gamma)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeObservation {
    pub row: usize,
    pub col: usize,
    /// Intact flag per breakable cell, row-major board order.
    pub intact: Vec<bool>,
}

/// Result of executing the last chosen move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeStep {
    pub next: MazeObservation,
    pub reward: f32,
    pub episode_ends: bool,
}

#[derive(Debug, Clone)]
pub struct MazeAgent {
    config: MazeAgentConfig,
    encoder: MazeStateEncoder,
    codec: DirectionCodec,
    table: QTable,
    policy: EpsilonGreedy,
    learner: DiscountedLearner,
    current: Option<usize>,
    pending: Option<(usize, usize)>,
}

impl MazeAgent {
    pub fn new(config: MazeAgentConfig) -> Result<Self> {
        let encoder = MazeStateEncoder::new(config.rows, config.cols, config.breakables)?;
        let codec = DirectionCodec;
        let table = QTable::new(encoder.num_states(), codec.num_actions())?;
        let policy = EpsilonGreedy::new(config.exploration)?;
        let learner = DiscountedLearner::new(config.learning_rate, config.gamma)?;
        Ok(Self {
            config,
            encoder,
            codec,
            table,
            policy,
            learner,
            current: None,
            pending: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.policy = self.policy.with_seed(seed);
        self
    }

    pub fn config(&self) -> &MazeAgentConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn encoder(&self) -> &MazeStateEncoder {
        &self.encoder
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon()
    }

    /// State the agent will act from next, if known.
    pub fn current_state(&self) -> Option<usize> {
        self.current
    }

    pub fn phase(&self) -> TurnPhase {
        if self.pending.is_some() {
            TurnPhase::AwaitingReward
        } else {
            TurnPhase::AwaitingPerception
        }
    }

    pub fn encode(&self, obs: &MazeObservation) -> Result<usize> {
        Ok(self.encoder.encode(obs.row, obs.col, &obs.intact)?)
    }

    fn check_state(&self, state: usize) -> Result<()> {
        if state >= self.encoder.num_states() {
            return Err(CoreError::StateOutOfRange {
                state,
                num_states: self.encoder.num_states(),
            }
            .into());
        }
        Ok(())
    }

    /// Chooses a move from `state` and remembers it for the next reward.
    pub fn choose_action(&mut self, state: usize) -> Result<Decision<Direction>> {
        if self.pending.is_some() {
            return Err(CoreError::OutOfOrder {
                expected: TurnPhase::AwaitingPerception,
                found: TurnPhase::AwaitingReward,
            }
            .into());
        }
        let sel = self.policy.choose(&self.table, state)?;
        let choice = self.codec.decode(sel.action)?;
        telemetry::decision(AGENT, state, sel.action, sel.why, sel.epsilon);
        self.current = Some(state);
        self.pending = Some((state, sel.action));
        Ok(Decision {
            state,
            action: sel.action,
            choice,
            score: self.table.get(state, sel.action)?,
            why: sel.why,
            epsilon: sel.epsilon,
        })
    }

    /// Chooses from the state recorded by the previous [`reward`](Self::reward).
    pub fn choose_from_current(&mut self) -> Result<Decision<Direction>> {
        let state = self.current.ok_or(AgentError::NoCurrentState)?;
        self.choose_action(state)
    }

    /// Applies the reward of the last move. `next_state` becomes the current state.
    pub fn reward(&mut self, next_state: usize, reward: f32, episode_ends: bool) -> Result<f32> {
        let (state, action) = self.pending.ok_or(CoreError::NoPendingAction)?;
        self.check_state(next_state)?;
        let value = self.learner.update(
            &mut self.table,
            state,
            action,
            reward,
            next_state,
            episode_ends,
        )?;
        telemetry::update(AGENT, state, action, reward, value);
        self.pending = None;
        self.current = Some(next_state);
        Ok(value)
    }

    /// Forgets the current state, e.g. when the driver resets the board.
    pub fn reset_episode(&mut self) {
        self.current = None;
        self.pending = None;
    }
}

impl Agent for MazeAgent {
    type Observation = MazeObservation;
    type Choice = Direction;
    type Outcome = MazeStep;
    type Error = AgentError;

    fn decide(&mut self, obs: &MazeObservation) -> Result<Decision<Direction>> {
        let state = self.encode(obs)?;
        self.choose_action(state)
    }

    fn feedback(&mut self, step: &MazeStep) -> Result<()> {
        let next = self.encode(&step.next)?;
        self.reward(next, step.reward, step.episode_ends).map(|_| ())
    }

    fn snapshot(&self) -> Value {
        AgentSnapshot::capture(AgentKind::Maze, &self.policy, &self.table).to_value()
    }

    fn load(&mut self, snapshot: Value) -> Result<()> {
        AgentSnapshot::from_value(snapshot)?.restore_into(
            AgentKind::Maze,
            &mut self.policy,
            &mut self.table,
        )?;
        self.reset_episode();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greedy(breakables: usize) -> MazeAgent {
        MazeAgent::new(MazeAgentConfig {
            breakables,
            exploration: EpsilonSchedule::greedy(),
            ..MazeAgentConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn sizes_follow_board() {
        let agent = greedy(6);
        assert_eq!(agent.table().num_states(), 4096);
        assert_eq!(agent.table().num_actions(), 4);
    }

    #[test]
    fn reward_bootstraps_and_advances_state() {
        let mut agent = greedy(0);
        let d = agent.choose_action(0).unwrap();
        assert_eq!(d.choice, Direction::Right);
        agent.reward(1, -0.1, false).unwrap();
        assert_eq!(agent.current_state(), Some(1));

        let d = agent.choose_from_current().unwrap();
        assert_eq!(d.state, 1);
        agent.reward(2, 1.0, true).unwrap();
        assert!((agent.table().get(1, 0).unwrap() - 0.5).abs() < 1e-6);

        // Q[0] = [-0.05, 0, 0, 0]: greedy now goes up, bootstrapping off max Q[1] = 0.5
        let d = agent.choose_action(0).unwrap();
        assert_eq!(d.choice, Direction::Up);
        let v = agent.reward(1, 0.0, false).unwrap();
        assert!((v - 0.5 * 0.99 * 0.5).abs() < 1e-6);
    }

    #[test]
    fn reward_before_choice_fails_loudly() {
        let mut agent = greedy(0);
        assert!(matches!(
            agent.reward(0, 1.0, false),
            Err(AgentError::Core(CoreError::NoPendingAction))
        ));
        assert!(matches!(
            agent.choose_from_current(),
            Err(AgentError::NoCurrentState)
        ));
    }

    #[test]
    fn double_choice_is_out_of_order() {
        let mut agent = greedy(0);
        agent.choose_action(3).unwrap();
        assert_eq!(agent.phase(), TurnPhase::AwaitingReward);
        assert!(matches!(
            agent.choose_action(3),
            Err(AgentError::Core(CoreError::OutOfOrder { .. }))
        ));
    }

    #[test]
    fn invalid_next_state_keeps_pending_action() {
        let mut agent = greedy(0);
        agent.choose_action(0).unwrap();
        assert!(agent.reward(64, 1.0, true).is_err());
        assert!(agent.reward(1, 1.0, true).is_ok());
    }

    #[test]
    fn trait_methods_encode_observations() {
        let mut agent = greedy(2);
        let start = MazeObservation {
            row: 0,
            col: 0,
            intact: vec![true, true],
        };
        let d = agent.decide(&start).unwrap();
        assert_eq!(d.state, 3);
        let step = MazeStep {
            next: MazeObservation {
                row: 0,
                col: 1,
                intact: vec![true, true],
            },
            reward: -1.0,
            episode_ends: false,
        };
        agent.feedback(&step).unwrap();
        assert_eq!(agent.current_state(), Some(7));
    }

    #[test]
    fn snapshot_rejects_card_snapshot() {
        let cards = crate::CardAgent::new(crate::CardAgentConfig::default()).unwrap();
        let mut agent = greedy(4);
        assert!(matches!(
            agent.load(cards.snapshot()),
            Err(AgentError::SnapshotMismatch(_))
        ));
    }
}
