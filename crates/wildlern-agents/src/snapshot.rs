//! Persisted agent state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use wildlern_core::QTable;

use crate::error::{AgentError, Result};
use crate::exploration::{EpsilonGreedy, EpsilonSchedule};
use crate::telemetry;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Cards,
    Maze,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub version: u32,
    pub kind: AgentKind,
    pub saved_at: String,
    pub schedule: EpsilonSchedule,
    pub steps: u64,
    pub epsilon: f32,
    pub q_table: QTable,
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

impl AgentSnapshot {
    pub(crate) fn capture(kind: AgentKind, policy: &EpsilonGreedy, table: &QTable) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            kind,
            saved_at: iso8601_now(),
            schedule: policy.schedule(),
            steps: policy.steps(),
            epsilon: policy.epsilon(),
            q_table: table.clone(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Value {
        // Only plain numbers and strings; serialisation cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Checks kind and table shape, then writes table and schedule position into
    /// the live agent parts. An invalid schedule is ignored with a warning and
    /// the agent keeps its own.
    pub(crate) fn restore_into(
        self,
        kind: AgentKind,
        policy: &mut EpsilonGreedy,
        table: &mut QTable,
    ) -> Result<()> {
        if self.kind != kind {
            return Err(AgentError::SnapshotMismatch(format!(
                "expected a {kind:?} snapshot, found {:?}",
                self.kind
            )));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(AgentError::SnapshotMismatch(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if !self.q_table.has_shape(table.num_states(), table.num_actions()) {
            return Err(AgentError::SnapshotMismatch(format!(
                "Q-table is {}x{}, agent expects {}x{}",
                self.q_table.num_states(),
                self.q_table.num_actions(),
                table.num_states(),
                table.num_actions()
            )));
        }
        let schedule = match self.schedule.validate() {
            Ok(()) => self.schedule,
            Err(e) => {
                telemetry::warn(&format!("snapshot schedule rejected, keeping current: {e}"));
                policy.schedule()
            }
        };
        policy.restore(schedule, self.steps);
        *table = self.q_table;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AgentKind::Maze).unwrap(), "\"maze\"");
    }

    #[test]
    fn capture_stamps_current_utc_time() {
        let policy = EpsilonGreedy::new(EpsilonSchedule::default()).unwrap();
        let snap = AgentSnapshot::capture(AgentKind::Maze, &policy, &QTable::new(1, 4).unwrap());
        assert_ne!(snap.saved_at, FALLBACK_TIMESTAMP);
        assert!(snap.saved_at.ends_with('Z'), "{}", snap.saved_at);
    }

    #[test]
    fn restore_rejects_other_kind_and_shape() {
        let policy = EpsilonGreedy::new(EpsilonSchedule::default()).unwrap();
        let table = QTable::new(3, 2).unwrap();
        let snap = AgentSnapshot::capture(AgentKind::Cards, &policy, &table);

        let mut p = policy.clone();
        let mut t = table.clone();
        assert!(matches!(
            snap.clone().restore_into(AgentKind::Maze, &mut p, &mut t),
            Err(AgentError::SnapshotMismatch(_))
        ));

        let mut wrong = QTable::new(4, 2).unwrap();
        assert!(matches!(
            snap.restore_into(AgentKind::Cards, &mut p, &mut wrong),
            Err(AgentError::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn restore_keeps_own_schedule_when_snapshot_schedule_is_invalid() {
        let mut policy = EpsilonGreedy::new(EpsilonSchedule::default()).unwrap();
        let mut table = QTable::new(1, 1).unwrap();
        let mut snap = AgentSnapshot::capture(AgentKind::Maze, &policy, &table);
        snap.schedule.cooling_steps = 0;
        snap.steps = 500;
        snap.restore_into(AgentKind::Maze, &mut policy, &mut table).unwrap();
        assert_eq!(policy.schedule(), EpsilonSchedule::default());
        assert_eq!(policy.steps(), 500);
    }
}
