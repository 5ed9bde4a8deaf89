//! Dense tabular value store.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// `num_states x num_actions` grid of value estimates, row-major, zero-initialised.
///
/// The shape is fixed at construction; every access is bounds-checked and
/// out-of-range indices surface as errors instead of defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQTable")]
pub struct QTable {
    num_states: usize,
    num_actions: usize,
    values: Vec<f32>,
}

/// Unchecked on-disk form; becomes a [`QTable`] only if the shape holds.
#[derive(Deserialize)]
struct RawQTable {
    num_states: usize,
    num_actions: usize,
    values: Vec<f32>,
}

impl TryFrom<RawQTable> for QTable {
    type Error = CoreError;

    fn try_from(raw: RawQTable) -> Result<Self> {
        let cells = cell_count(raw.num_states, raw.num_actions)?;
        if raw.values.len() != cells {
            return Err(CoreError::TableShape {
                expected: cells,
                found: raw.values.len(),
            });
        }
        Ok(Self {
            num_states: raw.num_states,
            num_actions: raw.num_actions,
            values: raw.values,
        })
    }
}

fn cell_count(num_states: usize, num_actions: usize) -> Result<usize> {
    if num_states == 0 || num_actions == 0 {
        return Err(CoreError::InvalidConfiguration(format!(
            "Q-table needs positive dimensions, got {num_states} states x {num_actions} actions"
        )));
    }
    num_states
        .checked_mul(num_actions)
        .ok_or_else(|| CoreError::InvalidConfiguration("Q-table size overflows usize".into()))
}

impl QTable {
    pub fn new(num_states: usize, num_actions: usize) -> Result<Self> {
        let cells = cell_count(num_states, num_actions)?;
        Ok(Self {
            num_states,
            num_actions,
            values: vec![0.0; cells],
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn row(&self, state: usize) -> Result<&[f32]> {
        if state >= self.num_states {
            return Err(CoreError::StateOutOfRange {
                state,
                num_states: self.num_states,
            });
        }
        let start = state * self.num_actions;
        Ok(&self.values[start..start + self.num_actions])
    }

    fn index(&self, state: usize, action: usize) -> Result<usize> {
        if state >= self.num_states {
            return Err(CoreError::StateOutOfRange {
                state,
                num_states: self.num_states,
            });
        }
        if action >= self.num_actions {
            return Err(CoreError::ActionOutOfRange {
                action,
                num_actions: self.num_actions,
            });
        }
        Ok(state * self.num_actions + action)
    }

    pub fn get(&self, state: usize, action: usize) -> Result<f32> {
        let idx = self.index(state, action)?;
        Ok(self.values[idx])
    }

    pub fn update(&mut self, state: usize, action: usize, value: f32) -> Result<()> {
        let idx = self.index(state, action)?;
        self.values[idx] = value;
        Ok(())
    }

    /// Highest-valued action for `state`. Scans ascending and only replaces
    /// the current best on a strict improvement, so ties go to the lowest index.
    pub fn best_action(&self, state: usize) -> Result<usize> {
        let row = self.row(state)?;
        let mut best = 0;
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = action;
            }
        }
        Ok(best)
    }

    /// Value of [`best_action`](Self::best_action) for `state`.
    pub fn max_value(&self, state: usize) -> Result<f32> {
        let best = self.best_action(state)?;
        self.get(state, best)
    }

    /// Whether the table shape matches the given spaces.
    pub fn has_shape(&self, num_states: usize, num_actions: usize) -> bool {
        self.num_states == num_states
            && self.num_actions == num_actions
            && self.values.len() == num_states * num_actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let q = QTable::new(4, 3).unwrap();
        for s in 0..4 {
            for a in 0..3 {
                assert_eq!(q.get(s, a).unwrap(), 0.0);
            }
        }
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(QTable::new(0, 3).is_err());
        assert!(QTable::new(3, 0).is_err());
    }

    #[test]
    fn update_then_get() {
        let mut q = QTable::new(2, 2).unwrap();
        q.update(1, 0, 1.5).unwrap();
        assert_eq!(q.get(1, 0).unwrap(), 1.5);
        assert_eq!(q.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn best_action_prefers_lowest_index_on_ties() {
        let mut q = QTable::new(1, 4).unwrap();
        assert_eq!(q.best_action(0).unwrap(), 0);
        q.update(0, 1, 2.0).unwrap();
        q.update(0, 3, 2.0).unwrap();
        assert_eq!(q.best_action(0).unwrap(), 1);
        assert_eq!(q.max_value(0).unwrap(), 2.0);
    }

    #[test]
    fn best_action_handles_negative_rows() {
        let mut q = QTable::new(1, 3).unwrap();
        q.update(0, 0, -3.0).unwrap();
        q.update(0, 1, -1.0).unwrap();
        q.update(0, 2, -2.0).unwrap();
        assert_eq!(q.best_action(0).unwrap(), 1);
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let mut q = QTable::new(2, 2).unwrap();
        assert_eq!(
            q.get(2, 0),
            Err(CoreError::StateOutOfRange {
                state: 2,
                num_states: 2
            })
        );
        assert_eq!(
            q.update(0, 5, 1.0),
            Err(CoreError::ActionOutOfRange {
                action: 5,
                num_actions: 2
            })
        );
        assert!(q.best_action(9).is_err());
    }

    #[test]
    fn deserialize_checks_shape() {
        let mut q = QTable::new(2, 3).unwrap();
        q.update(1, 2, 0.5).unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(serde_json::from_str::<QTable>(&json).unwrap(), q);

        let truncated = r#"{"num_states":4,"num_actions":4,"values":[0.0]}"#;
        let err = serde_json::from_str::<QTable>(truncated).unwrap_err();
        assert!(err.to_string().contains("16 values"), "{err}");

        let empty = r#"{"num_states":0,"num_actions":4,"values":[]}"#;
        assert!(serde_json::from_str::<QTable>(empty).is_err());
    }
}
