//! Task records: one prompt-to-completion cycle within a session.

use serde::{Deserialize, Serialize};

/// A row of the session ledger.
///
/// Timestamps are kept as the stored RFC 3339 strings; see
/// [`crate::format_duration`] for turning a pair into elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub session_id: String,
    pub created_at: String,
    pub prompt: String,
    pub cwd: String,
    /// 1-based ordinal within `session_id`.
    pub seq: i64,
    pub stopped_at: Option<String>,
    pub last_wait_user_at: Option<String>,
}

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Submitted and not yet stopped.
    Running,
    /// Still open, and the assistant has asked for input at least once.
    WaitingOnUser,
    /// Stopped. Terminal.
    Completed,
}

impl TaskRecord {
    pub fn status(&self) -> TaskStatus {
        match (&self.stopped_at, &self.last_wait_user_at) {
            (Some(_), _) => TaskStatus::Completed,
            (None, Some(_)) => TaskStatus::WaitingOnUser,
            (None, None) => TaskStatus::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TaskRecord {
        TaskRecord {
            id: 1,
            session_id: "s1".into(),
            created_at: "2025-01-01T10:00:00.000Z".into(),
            prompt: "hi".into(),
            cwd: "/repo".into(),
            seq: 1,
            stopped_at: None,
            last_wait_user_at: None,
        }
    }

    #[test]
    fn fresh_record_is_running() {
        assert_eq!(record().status(), TaskStatus::Running);
    }

    #[test]
    fn wait_signal_marks_waiting() {
        let mut task = record();
        task.last_wait_user_at = Some("2025-01-01T10:01:00.000Z".into());
        assert_eq!(task.status(), TaskStatus::WaitingOnUser);
    }

    #[test]
    fn stop_wins_over_wait() {
        let mut task = record();
        task.last_wait_user_at = Some("2025-01-01T10:01:00.000Z".into());
        task.stopped_at = Some("2025-01-01T10:02:00.000Z".into());
        assert_eq!(task.status(), TaskStatus::Completed);
    }
}
