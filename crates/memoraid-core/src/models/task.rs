//! Derived daily tasks (client-side join of routine and log).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::{parse_time_of_day, LogId, Routine, RoutineId, TaskLog, TaskStatus};

/// Where a derived task came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskOrigin {
    /// An active routine scheduled on the date
    Scheduled,
    /// A log whose routine no longer exists (historical entry)
    Orphaned,
}

/// A routine occurrence on one date, annotated with its computed status.
///
/// Has no identity beyond the (routine, date) pair and is rebuilt on every fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyTask {
    pub routine_id: RoutineId,
    /// Log backing the status, `None` while implicitly pending
    pub log_id: Option<LogId>,
    pub name: String,
    pub time: String,
    pub icon: String,
    pub notes: Option<String>,
    pub status: TaskStatus,
    pub origin: TaskOrigin,
}

impl DailyTask {
    /// Join a routine with its (optional) log.
    pub fn from_routine(routine: &Routine, log: Option<&TaskLog>) -> Self {
        Self {
            routine_id: routine.id,
            log_id: log.map(|l| l.id),
            name: routine.name.clone(),
            time: routine.time.clone(),
            icon: routine.icon.clone(),
            notes: routine.notes.clone(),
            status: log.map(|l| l.status).unwrap_or_default(),
            origin: TaskOrigin::Scheduled,
        }
    }

    /// Build a task from a log alone, using its denormalised routine fields.
    pub fn from_log(log: &TaskLog) -> Self {
        Self {
            routine_id: log.routine,
            log_id: Some(log.id),
            name: log
                .routine_name
                .clone()
                .unwrap_or_else(|| "Deleted Routine".to_string()),
            time: log
                .routine_time
                .clone()
                .unwrap_or_else(|| "00:00".to_string()),
            icon: log
                .routine_icon
                .clone()
                .unwrap_or_else(|| "activity".to_string()),
            notes: log.notes.clone(),
            status: log.status,
            origin: TaskOrigin::Orphaned,
        }
    }

    pub fn scheduled_time(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.time)
    }

    /// Sort key used for ordering tasks.
    pub fn time_key(&self) -> &str {
        if self.time.is_empty() {
            "00:00"
        } else {
            &self.time
        }
    }

    /// `HH:MM` display form of the scheduled time.
    pub fn display_time(&self) -> &str {
        self.time_key().get(..5).unwrap_or(self.time_key())
    }

    pub fn is_historical(&self) -> bool {
        self.origin == TaskOrigin::Orphaned
    }
}

/// Progress counters over a list of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub missed: usize,
    pub escalated: usize,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[DailyTask]) -> Self {
        tasks.iter().fold(Self::default(), |mut acc, task| {
            acc.total += 1;
            match task.status {
                TaskStatus::Pending => acc.pending += 1,
                TaskStatus::Completed => acc.completed += 1,
                TaskStatus::Missed => acc.missed += 1,
                TaskStatus::Escalated => acc.escalated += 1,
            }
            acc
        })
    }

    /// Tasks that are done for the day (completed or escalated).
    pub fn done(&self) -> usize {
        self.completed + self.escalated
    }
}
