//! Agent for the card-matching game.
//!
//! Each turn the agent sees the enemy's cards (as class labels) and its own
//! dealt hand, plays one class per enemy slot and is told a reward. The next
//! deal is random, so learning uses the immediate-reward rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wildlern_core::{
    ActionCodec, Agent, CardActionCodec, CardStateEncoder, Classifier, CoreError, Decision,
    QTable, TurnPhase,
};

use crate::error::{AgentError, Result};
use crate::exploration::{EpsilonGreedy, EpsilonSchedule};
use crate::learner::ImmediateLearner;
use crate::snapshot::{AgentKind, AgentSnapshot};
use crate::telemetry;

const AGENT: &str = "cards";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardAgentConfig {
    pub num_classes: usize,
    pub num_enemy_cards: usize,
    pub deck_size: usize,
    pub learning_rate: f32,
    pub exploration: EpsilonSchedule,
}

impl Default for CardAgentConfig {
    fn default() -> Self {
        Self {
            num_classes: 3,
            num_enemy_cards: 3,
            deck_size: 4,
            learning_rate: 0.5,
            exploration: EpsilonSchedule {
                start: 1.0,
                min: 0.1,
                cooling_steps: 1000,
            },
        }
    }
}

impl CardAgentConfig {
    /// Checks every derived size and rate without allocating the Q-table.
    pub fn validate(&self) -> Result<()> {
        CardStateEncoder::new(self.num_classes, self.num_enemy_cards, self.deck_size)?;
        CardActionCodec::new(self.num_classes, self.num_enemy_cards)?;
        self.exploration.validate()?;
        ImmediateLearner::new(self.learning_rate)?;
        Ok(())
    }
}

/// What the agent perceives at the start of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardObservation {
    /// Class label of every visible enemy card.
    pub enemy_cards: Vec<usize>,
    /// Class label of every card in the agent's hand.
    pub hand: Vec<usize>,
}

impl CardObservation {
    /// Labels each enemy card with `classifier`.
    pub fn classify<C: Classifier>(
        classifier: &C,
        enemy_inputs: &[C::Input],
        hand: Vec<usize>,
    ) -> Result<Self> {
        let enemy_cards = enemy_inputs
            .iter()
            .map(|input| classifier.classify(input))
            .collect::<std::result::Result<Vec<_>, CoreError>>()?;
        Ok(Self { enemy_cards, hand })
    }
}

#[derive(Debug, Clone)]
pub struct CardAgent {
    config: CardAgentConfig,
    encoder: CardStateEncoder,
    codec: CardActionCodec,
    table: QTable,
    policy: EpsilonGreedy,
    learner: ImmediateLearner,
    phase: TurnPhase,
    observed: Option<usize>,
    pending: Option<(usize, usize)>,
}

impl CardAgent {
    pub fn new(config: CardAgentConfig) -> Result<Self> {
        let encoder =
            CardStateEncoder::new(config.num_classes, config.num_enemy_cards, config.deck_size)?;
        // As many played cards as enemy cards.
        let codec = CardActionCodec::new(config.num_classes, config.num_enemy_cards)?;
        let table = QTable::new(encoder.num_states(), codec.num_actions())?;
        let policy = EpsilonGreedy::new(config.exploration)?;
        let learner = ImmediateLearner::new(config.learning_rate)?;
        Ok(Self {
            config,
            encoder,
            codec,
            table,
            policy,
            learner,
            phase: TurnPhase::AwaitingPerception,
            observed: None,
            pending: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.policy = self.policy.with_seed(seed);
        self
    }

    pub fn config(&self) -> &CardAgentConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn codec(&self) -> &CardActionCodec {
        &self.codec
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    fn expect_phase(&self, expected: TurnPhase) -> Result<()> {
        if self.phase != expected {
            return Err(CoreError::OutOfOrder {
                expected,
                found: self.phase,
            }
            .into());
        }
        Ok(())
    }

    /// Encodes the observation and moves on to [`TurnPhase::Deciding`].
    pub fn observe(&mut self, obs: &CardObservation) -> Result<usize> {
        self.expect_phase(TurnPhase::AwaitingPerception)?;
        let state = self.encoder.encode(&obs.enemy_cards, &obs.hand)?;
        self.observed = Some(state);
        self.phase = TurnPhase::Deciding;
        Ok(state)
    }

    /// Picks the cards to play for the observed state.
    pub fn choose(&mut self) -> Result<Decision<Vec<usize>>> {
        self.expect_phase(TurnPhase::Deciding)?;
        let state = self.observed.ok_or(CoreError::OutOfOrder {
            expected: TurnPhase::Deciding,
            found: TurnPhase::AwaitingPerception,
        })?;
        let sel = self.policy.choose(&self.table, state)?;
        let choice = self.codec.decode(sel.action)?;
        telemetry::decision(AGENT, state, sel.action, sel.why, sel.epsilon);
        self.pending = Some((state, sel.action));
        self.phase = TurnPhase::AwaitingReward;
        Ok(Decision {
            state,
            action: sel.action,
            choice,
            score: self.table.get(state, sel.action)?,
            why: sel.why,
            epsilon: sel.epsilon,
        })
    }

    /// Observe and choose in one call.
    pub fn play(&mut self, obs: &CardObservation) -> Result<Decision<Vec<usize>>> {
        self.observe(obs)?;
        self.choose()
    }

    /// Applies the reward for the last played hand; returns the new Q-value.
    pub fn reward(&mut self, reward: f32) -> Result<f32> {
        let (state, action) = self.pending.ok_or(CoreError::NoPendingAction)?;
        self.expect_phase(TurnPhase::AwaitingReward)?;
        let value = self.learner.update(&mut self.table, state, action, reward)?;
        telemetry::update(AGENT, state, action, reward, value);
        self.pending = None;
        self.observed = None;
        self.phase = TurnPhase::AwaitingPerception;
        Ok(value)
    }
}

impl Agent for CardAgent {
    type Observation = CardObservation;
    type Choice = Vec<usize>;
    type Outcome = f32;
    type Error = AgentError;

    fn decide(&mut self, obs: &CardObservation) -> Result<Decision<Vec<usize>>> {
        self.play(obs)
    }

    fn feedback(&mut self, reward: &f32) -> Result<()> {
        self.reward(*reward).map(|_| ())
    }

    fn snapshot(&self) -> Value {
        AgentSnapshot::capture(AgentKind::Cards, &self.policy, &self.table).to_value()
    }

    /// Restores the Q-table and exploration position. Any turn in flight is dropped.
    fn load(&mut self, snapshot: Value) -> Result<()> {
        AgentSnapshot::from_value(snapshot)?.restore_into(
            AgentKind::Cards,
            &mut self.policy,
            &mut self.table,
        )?;
        self.phase = TurnPhase::AwaitingPerception;
        self.observed = None;
        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greedy_agent() -> CardAgent {
        CardAgent::new(CardAgentConfig {
            exploration: EpsilonSchedule::greedy(),
            ..CardAgentConfig::default()
        })
        .unwrap()
    }

    fn obs() -> CardObservation {
        CardObservation {
            enemy_cards: vec![0, 1, 2],
            hand: vec![0, 1, 1, 2],
        }
    }

    #[test]
    fn default_sizes() {
        let agent = CardAgent::new(CardAgentConfig::default()).unwrap();
        assert_eq!(agent.table().num_states(), 675);
        assert_eq!(agent.table().num_actions(), 27);
        assert!((agent.epsilon() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn full_turn_updates_chosen_cell() {
        let mut agent = greedy_agent();
        let d = agent.play(&obs()).unwrap();
        assert_eq!(d.action, 0);
        assert_eq!(d.choice, vec![0, 0, 0]);
        assert_eq!(agent.phase(), TurnPhase::AwaitingReward);
        let v = agent.reward(1.0).unwrap();
        assert!((v - 0.5).abs() < 1e-6);
        assert_eq!(agent.table().get(d.state, d.action).unwrap(), v);
        assert_eq!(agent.phase(), TurnPhase::AwaitingPerception);
    }

    #[test]
    fn reward_without_decision_fails() {
        let mut agent = greedy_agent();
        assert!(matches!(
            agent.reward(1.0),
            Err(AgentError::Core(CoreError::NoPendingAction))
        ));
        agent.play(&obs()).unwrap();
        agent.reward(1.0).unwrap();
        assert!(matches!(
            agent.reward(1.0),
            Err(AgentError::Core(CoreError::NoPendingAction))
        ));
    }

    #[test]
    fn turn_order_is_enforced() {
        let mut agent = greedy_agent();
        assert!(matches!(
            agent.choose(),
            Err(AgentError::Core(CoreError::OutOfOrder {
                expected: TurnPhase::Deciding,
                found: TurnPhase::AwaitingPerception
            }))
        ));
        agent.observe(&obs()).unwrap();
        assert!(matches!(
            agent.observe(&obs()),
            Err(AgentError::Core(CoreError::OutOfOrder { .. }))
        ));
    }

    #[test]
    fn bad_observation_keeps_phase() {
        let mut agent = greedy_agent();
        let bad = CardObservation {
            enemy_cards: vec![0, 1],
            hand: vec![0, 0, 0, 0],
        };
        assert!(agent.observe(&bad).is_err());
        assert_eq!(agent.phase(), TurnPhase::AwaitingPerception);
    }

    #[test]
    fn snapshot_roundtrip_restores_table_and_epsilon() {
        let mut agent = CardAgent::new(CardAgentConfig::default()).unwrap().with_seed(3);
        for _ in 0..20 {
            agent.play(&obs()).unwrap();
            agent.reward(1.0).unwrap();
        }
        let snap = agent.snapshot();

        let mut restored = CardAgent::new(CardAgentConfig::default()).unwrap();
        restored.load(snap).unwrap();
        assert_eq!(restored.table(), agent.table());
        assert!((restored.epsilon() - agent.epsilon()).abs() < f32::EPSILON);
    }

    #[test]
    fn validate_reports_bad_rate() {
        let cfg = CardAgentConfig {
            learning_rate: 0.0,
            ..CardAgentConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(AgentError::InvalidConfiguration(_))
        ));
        assert!(CardAgentConfig::default().validate().is_ok());
    }

    #[test]
    fn config_fields_default_when_missing() {
        let cfg: CardAgentConfig = serde_json::from_str(r#"{"deck_size": 5}"#).unwrap();
        assert_eq!(cfg.deck_size, 5);
        assert_eq!(cfg.num_classes, 3);
        assert_eq!(cfg.exploration.cooling_steps, 1000);
    }
}
