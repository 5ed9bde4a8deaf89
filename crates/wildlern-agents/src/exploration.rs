//! ε-greedy action selection with linear decay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use wildlern_core::{QTable, Why};

use crate::error::{AgentError, Result};

/// Linear schedule from `start` down to `min` over `cooling_steps` selections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub min: f32,
    pub cooling_steps: u32,
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self {
            start: 1.0,
            min: 0.1,
            cooling_steps: 1000,
        }
    }
}

impl EpsilonSchedule {
    /// Schedule that never explores.
    pub fn greedy() -> Self {
        Self {
            start: 0.0,
            min: 0.0,
            cooling_steps: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 <= self.min && self.min <= self.start && self.start <= 1.0;
        if !ordered || !self.start.is_finite() || !self.min.is_finite() {
            return Err(AgentError::InvalidConfiguration(format!(
                "epsilon schedule needs 0 <= min ({}) <= start ({}) <= 1",
                self.min, self.start
            )));
        }
        if self.cooling_steps == 0 {
            return Err(AgentError::InvalidConfiguration(
                "cooling_steps must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Decrement applied per selection.
    pub fn step(&self) -> f32 {
        (self.start - self.min) / self.cooling_steps as f32
    }

    /// Exploration rate after `steps` selections.
    pub fn epsilon_after(&self, steps: u64) -> f32 {
        if steps >= u64::from(self.cooling_steps) {
            return self.min;
        }
        #[allow(clippy::cast_precision_loss)]
        let decayed = self.start - self.step() * steps as f32;
        decayed.max(self.min)
    }
}

/// Outcome of a single selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub action: usize,
    pub why: Why,
    /// Rate in force for this draw, before decay.
    pub epsilon: f32,
}

/// ε-greedy selector over a [`QTable`].
///
/// The step counter lives for the whole training run and is not reset at
/// episode boundaries.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    schedule: EpsilonSchedule,
    steps: u64,
    rng: StdRng,
}

impl EpsilonGreedy {
    pub fn new(schedule: EpsilonSchedule) -> Result<Self> {
        schedule.validate()?;
        Ok(Self {
            schedule,
            steps: 0,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn schedule(&self) -> EpsilonSchedule {
        self.schedule
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn epsilon(&self) -> f32 {
        self.schedule.epsilon_after(self.steps)
    }

    /// Restores schedule position, e.g. after loading a snapshot.
    pub(crate) fn restore(&mut self, schedule: EpsilonSchedule, steps: u64) {
        self.schedule = schedule;
        self.steps = steps;
    }

    /// Picks an action for `state`, then decays epsilon by one step.
    pub fn choose(&mut self, table: &QTable, state: usize) -> Result<Selection> {
        let greedy = table.best_action(state)?;
        let epsilon = self.epsilon();
        let selection = if self.rng.gen::<f32>() < epsilon {
            Selection {
                action: self.rng.gen_range(0..table.num_actions()),
                why: Why::Explore,
                epsilon,
            }
        } else {
            Selection {
                action: greedy,
                why: Why::Exploit,
                epsilon,
            }
        };
        self.steps = self.steps.saturating_add(1);
        Ok(selection)
    }
}
