//! Task execution logs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RoutineId;

/// Backend identifier of a log.
pub type LogId = i64;

/// Outcome of one routine occurrence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// No outcome yet (implicit when no log exists)
    #[default]
    Pending,
    Completed,
    /// Window passed without completion
    Missed,
    /// Caregiver acknowledged a missed task
    Escalated,
}

impl TaskStatus {
    /// Completed and escalated tasks are done for the day.
    pub fn is_resolved(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Escalated)
    }

    /// Pending and missed tasks still need someone to act.
    pub fn is_actionable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Missed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Missed => "missed",
            TaskStatus::Escalated => "escalated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(TaskStatus::Pending),
            "completed" => Some(TaskStatus::Completed),
            "missed" => Some(TaskStatus::Missed),
            "escalated" => Some(TaskStatus::Escalated),
            _ => None,
        }
    }
}

/// The record of a routine's outcome on a specific date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskLog {
    pub id: LogId,
    pub routine: RoutineId,
    pub date: NaiveDate,
    pub status: TaskStatus,
    /// User who handled the task (caregiver or patient)
    #[serde(default)]
    pub handled_by: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Denormalised routine fields, kept so logs of deleted routines still render
    #[serde(default)]
    pub routine_name: Option<String>,
    #[serde(default)]
    pub routine_time: Option<String>,
    #[serde(default)]
    pub routine_icon: Option<String>,
}

/// Request body for creating a log.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewLog {
    pub routine: RoutineId,
    pub date: NaiveDate,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewLog {
    pub fn new(routine: RoutineId, date: NaiveDate, status: TaskStatus) -> Self {
        Self {
            routine,
            date,
            status,
            handled_by: None,
            notes: None,
        }
    }
}

/// Find the log for a routine among the logs of one date.
pub fn find_log(logs: &[TaskLog], routine: RoutineId) -> Option<&TaskLog> {
    logs.iter().find(|log| log.routine == routine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(TaskStatus::Completed.is_resolved());
        assert!(TaskStatus::Escalated.is_resolved());
        assert!(TaskStatus::Pending.is_actionable());
        assert!(TaskStatus::Missed.is_actionable());
        assert!(!TaskStatus::Missed.is_resolved());
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Completed,
            TaskStatus::Missed,
            TaskStatus::Escalated,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn test_new_log_body_omits_empty_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let body = serde_json::to_value(NewLog::new(4, date, TaskStatus::Completed)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"routine": 4, "date": "2026-10-18", "status": "completed"})
        );
    }
}
