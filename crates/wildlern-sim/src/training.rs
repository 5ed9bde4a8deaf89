//! Training loops and the statistics they report.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use wildlern_agents::{CardAgent, CardObservation, MazeAgent};
use wildlern_core::Classifier;

use crate::card_table::{CardTable, HandOutcome};
use crate::error::{Result, SimError};
use crate::maze_board::MazeBoard;

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Episodes kept verbatim at the end of a maze report.
pub const RECENT_EPISODES: usize = 10;

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

/// Counts of hand outcomes over a run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandTally {
    pub total: u64,
    pub won: u64,
    pub lost: u64,
    pub tie: u64,
    pub invalid: u64,
    pub total_reward: f32,
}

impl HandTally {
    pub fn record(&mut self, outcome: HandOutcome, reward: f32) {
        self.total += 1;
        match outcome {
            HandOutcome::Won => self.won += 1,
            HandOutcome::Lost => self.lost += 1,
            HandOutcome::Tie => self.tie += 1,
            HandOutcome::Invalid => self.invalid += 1,
        }
        if reward.is_finite() {
            self.total_reward += reward;
        }
    }

    /// Share of won hands (0.0 to 1.0).
    #[must_use]
    pub fn win_rate(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.won as f32 / self.total as f32
        }
    }

    #[must_use]
    pub fn average_reward(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.total_reward / self.total as f32
        }
    }
}

/// Rolling mean over the last `capacity` values.
#[derive(Debug, Clone)]
struct Window {
    capacity: usize,
    values: VecDeque<f32>,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            values: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    fn push(&mut self, value: f32) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.values.iter().sum::<f32>() / self.values.len() as f32
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRunReport {
    pub ts: String,
    pub turns: u64,
    pub tally: HandTally,
    pub win_rate: f32,
    pub average_reward: f32,
    /// Mean reward over the last `window` turns.
    pub recent_average_reward: f32,
    pub window: usize,
    pub final_epsilon: f32,
}

/// Plays `turns` hands. Enemy cards reach the agent through `classifier`;
/// hands are judged against the true labels.
pub fn train_cards<C>(
    agent: &mut CardAgent,
    table: &mut CardTable,
    classifier: &C,
    turns: u64,
    window: usize,
) -> Result<CardRunReport>
where
    C: Classifier<Input = usize>,
{
    let mut tally = HandTally::default();
    let mut recent = Window::new(window);
    for _ in 0..turns {
        let deal = table.deal();
        let obs = CardObservation::classify(classifier, &deal.enemy_cards, deal.hand.clone())?;
        let decision = agent.play(&obs)?;
        let outcome = table.judge(&deal, &decision.choice)?;
        let reward = table.reward(outcome);
        agent.reward(reward)?;
        tally.record(outcome, reward);
        recent.push(reward);
    }
    Ok(CardRunReport {
        ts: iso8601_now(),
        turns,
        win_rate: tally.win_rate(),
        average_reward: tally.average_reward(),
        tally,
        recent_average_reward: recent.mean(),
        window: recent.capacity,
        final_epsilon: agent.epsilon(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episode: u64,
    pub turns: u32,
    pub reward: f32,
    pub goal_reached: bool,
    /// Mean episode reward over the run so far, this episode included.
    /// A lone [`run_episode`] reports its own reward here.
    pub running_average: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MazeRunReport {
    pub ts: String,
    pub episodes: u64,
    pub goals: u64,
    pub global_reward: f32,
    /// `global_reward / episodes`.
    pub average_reward: f32,
    pub best_episode_reward: Option<f32>,
    pub recent: Vec<EpisodeStats>,
    pub final_epsilon: f32,
}

/// Runs one episode: the board is reset, the agent acts until the goal or the
/// turn budget ends it.
pub fn run_episode(
    agent: &mut MazeAgent,
    board: &mut MazeBoard,
    episode: u64,
    episode_turns: u32,
) -> Result<EpisodeStats> {
    if episode_turns == 0 {
        return Err(SimError::InvalidPlay("episode_turns must be positive".into()));
    }
    board.reset();
    agent.reset_episode();
    let mut stats = EpisodeStats {
        episode,
        turns: 0,
        reward: 0.0,
        goal_reached: false,
        running_average: 0.0,
    };
    let start = agent.encode(&board.observation())?;
    let mut decision = agent.choose_action(start)?;
    loop {
        let outcome = board.step(decision.choice);
        stats.turns += 1;
        stats.reward += outcome.reward;
        let next = agent.encode(&board.observation())?;
        let ends = outcome.goal_reached || stats.turns >= episode_turns;
        agent.reward(next, outcome.reward, ends)?;
        if ends {
            stats.goal_reached = outcome.goal_reached;
            stats.running_average = stats.reward;
            return Ok(stats);
        }
        decision = agent.choose_from_current()?;
    }
}

pub fn train_maze(
    agent: &mut MazeAgent,
    board: &mut MazeBoard,
    episodes: u64,
    episode_turns: u32,
) -> Result<MazeRunReport> {
    let mut goals = 0;
    let mut global_reward = 0.0;
    let mut best: Option<f32> = None;
    let mut recent = VecDeque::with_capacity(RECENT_EPISODES);
    for episode in 1..=episodes {
        let mut stats = run_episode(agent, board, episode, episode_turns)?;
        if stats.goal_reached {
            goals += 1;
        }
        global_reward += stats.reward;
        #[allow(clippy::cast_precision_loss)]
        {
            stats.running_average = global_reward / episode as f32;
        }
        best = Some(best.map_or(stats.reward, |b: f32| b.max(stats.reward)));
        if recent.len() == RECENT_EPISODES {
            recent.pop_front();
        }
        recent.push_back(stats);
    }
    #[allow(clippy::cast_precision_loss)]
    let average_reward = if episodes == 0 {
        0.0
    } else {
        global_reward / episodes as f32
    };
    Ok(MazeRunReport {
        ts: iso8601_now(),
        episodes,
        goals,
        global_reward,
        average_reward,
        best_episode_reward: best,
        recent: recent.into(),
        final_epsilon: agent.epsilon(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_rates() {
        let mut tally = HandTally::default();
        assert_eq!(tally.win_rate(), 0.0);
        tally.record(HandOutcome::Won, 1.0);
        tally.record(HandOutcome::Lost, -1.0);
        tally.record(HandOutcome::Won, 1.0);
        tally.record(HandOutcome::Invalid, -2.0);
        assert_eq!(tally.total, 4);
        assert!((tally.win_rate() - 0.5).abs() < f32::EPSILON);
        assert!((tally.average_reward() - -0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn window_keeps_last_values() {
        let mut w = Window::new(2);
        assert_eq!(w.mean(), 0.0);
        w.push(1.0);
        w.push(3.0);
        w.push(5.0);
        assert!((w.mean() - 4.0).abs() < f32::EPSILON);
    }
}
