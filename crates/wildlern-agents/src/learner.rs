//! Q-value update rules.

use serde::{Deserialize, Serialize};
use wildlern_core::QTable;

use crate::error::{AgentError, Result};

fn check_rate(name: &str, value: f32, allow_zero: bool) -> Result<()> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if !(lower_ok && value <= 1.0) {
        return Err(AgentError::InvalidConfiguration(format!(
            "{name} must be in {}0, 1], got {value}",
            if allow_zero { "[" } else { "(" }
        )));
    }
    Ok(())
}

/// Moves `Q[s,a]` towards `target` by `learning_rate`, returns the new value.
fn step_towards(
    table: &mut QTable,
    state: usize,
    action: usize,
    target: f32,
    learning_rate: f32,
) -> Result<f32> {
    let old = table.get(state, action)?;
    let new = old + learning_rate * (target - old);
    table.update(state, action, new)?;
    Ok(new)
}

/// `Q[s,a] += lr * (r - Q[s,a])`.
///
/// For environments whose next state carries no signal (a fresh random deal
/// every turn); the value becomes an exponential moving average of rewards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmediateLearner {
    pub learning_rate: f32,
}

impl ImmediateLearner {
    pub fn new(learning_rate: f32) -> Result<Self> {
        check_rate("learning_rate", learning_rate, false)?;
        Ok(Self { learning_rate })
    }

    pub fn update(
        &self,
        table: &mut QTable,
        state: usize,
        action: usize,
        reward: f32,
    ) -> Result<f32> {
        step_towards(table, state, action, reward, self.learning_rate)
    }
}

/// One-step Q-learning with bootstrap off the next state.
///
/// Terminal steps use the plain reward as target; `gamma` and the next state
/// are not consulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountedLearner {
    pub learning_rate: f32,
    pub gamma: f32,
}

impl DiscountedLearner {
    pub fn new(learning_rate: f32, gamma: f32) -> Result<Self> {
        check_rate("learning_rate", learning_rate, false)?;
        check_rate("gamma", gamma, true)?;
        Ok(Self {
            learning_rate,
            gamma,
        })
    }

    pub fn update(
        &self,
        table: &mut QTable,
        prev_state: usize,
        action: usize,
        reward: f32,
        next_state: usize,
        episode_ends: bool,
    ) -> Result<f32> {
        let target = if episode_ends {
            reward
        } else {
            reward + self.gamma * table.max_value(next_state)?
        };
        step_towards(table, prev_state, action, target, self.learning_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_update_converges_to_constant_reward() {
        let mut table = QTable::new(3, 2).unwrap();
        let learner = ImmediateLearner::new(0.5).unwrap();
        for _ in 0..50 {
            learner.update(&mut table, 2, 1, -0.1).unwrap();
        }
        assert!((table.get(2, 1).unwrap() - -0.1).abs() < 1e-6);
        assert_eq!(table.get(2, 0).unwrap(), 0.0);
    }

    #[test]
    fn immediate_update_single_step() {
        let mut table = QTable::new(1, 1).unwrap();
        table.update(0, 0, 1.0).unwrap();
        let v = ImmediateLearner::new(0.5)
            .unwrap()
            .update(&mut table, 0, 0, -1.0)
            .unwrap();
        assert!((v - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn discounted_update_bootstraps_from_best_next_action() {
        let mut table = QTable::new(2, 3).unwrap();
        table.update(1, 0, 1.0).unwrap();
        table.update(1, 2, 2.0).unwrap();
        let learner = DiscountedLearner::new(0.5, 0.99).unwrap();
        let v = learner.update(&mut table, 0, 1, 0.0, 1, false).unwrap();
        // 0.5 * (0 + 0.99 * 2.0)
        assert!((v - 0.99).abs() < 1e-6);
    }

    #[test]
    fn terminal_update_matches_immediate_rule() {
        let mut a = QTable::new(2, 2).unwrap();
        a.update(1, 0, 100.0).unwrap();
        a.update(0, 1, 0.3).unwrap();
        let mut b = a.clone();

        let discounted = DiscountedLearner::new(0.5, 0.99).unwrap();
        let immediate = ImmediateLearner::new(0.5).unwrap();
        let va = discounted.update(&mut a, 0, 1, 1.0, 1, true).unwrap();
        let vb = immediate.update(&mut b, 0, 1, 1.0).unwrap();
        assert_eq!(va, vb);
        assert_eq!(a, b);
    }

    #[test]
    fn terminal_update_ignores_next_state_entirely() {
        let mut table = QTable::new(2, 2).unwrap();
        let learner = DiscountedLearner::new(0.5, 0.99).unwrap();
        // next state is out of range but never looked at
        assert!(learner.update(&mut table, 0, 0, 1.0, 99, true).is_ok());
        assert!(learner.update(&mut table, 0, 0, 1.0, 99, false).is_err());
    }

    #[test]
    fn failed_update_leaves_table_untouched() {
        let mut table = QTable::new(2, 2).unwrap();
        let before = table.clone();
        let learner = DiscountedLearner::new(0.5, 0.99).unwrap();
        assert!(learner.update(&mut table, 0, 5, 1.0, 1, false).is_err());
        assert_eq!(table, before);
    }

    #[test]
    fn rejects_bad_rates() {
        assert!(ImmediateLearner::new(0.0).is_err());
        assert!(ImmediateLearner::new(1.5).is_err());
        assert!(DiscountedLearner::new(0.5, -0.1).is_err());
        assert!(DiscountedLearner::new(0.5, f32::NAN).is_err());
        assert!(DiscountedLearner::new(0.5, 0.0).is_ok());
    }
}
