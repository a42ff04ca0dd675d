//! Typed identifiers shared across write-path components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable query identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(
    /// Raw numeric id value.
    pub u64,
);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable stage identifier within a query DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageId(
    /// Raw numeric id value.
    pub u64,
);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable task identifier within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(
    /// Raw numeric id value.
    pub u64,
);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attempt-keyed task identity.
///
/// Accelerator lease bookkeeping and task metrics are keyed by the full
/// attempt so a retried task is never mistaken for its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskAttemptId {
    pub query_id: QueryId,
    pub stage_id: StageId,
    pub task_id: TaskId,
    pub attempt: u32,
}

impl TaskAttemptId {
    #[must_use]
    pub fn new(query_id: u64, stage_id: u64, task_id: u64, attempt: u32) -> Self {
        Self {
            query_id: QueryId(query_id),
            stage_id: StageId(stage_id),
            task_id: TaskId(task_id),
            attempt,
        }
    }
}

impl fmt::Display for TaskAttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q{}/s{}/t{}/a{}",
            self.query_id, self.stage_id, self.task_id, self.attempt
        )
    }
}
