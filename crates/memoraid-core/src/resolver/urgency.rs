//! Urgency tiers for the next task.
//!
//! Two classifiers share the same time arithmetic:
//! - patient view: normal / upcoming / missed
//! - caregiver overview: overdue / due soon / scheduled / up next

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{parse_time_of_day, DailyTask, TaskStatus};

/// Minutes before the slot at which a task counts as upcoming / due soon.
pub const DUE_SOON_MINUTES: i64 = 30;

/// Minutes before the slot at which the overview still shows "Scheduled Routine".
pub const SCHEDULED_WINDOW_MINUTES: i64 = 120;

/// Marker the stats endpoint puts in `next_task_time` for tomorrow's first task.
pub const TOMORROW_MARKER: &str = "Tomorrow";

/// Patient-facing urgency badge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    /// Due within the next 30 minutes
    Upcoming,
    /// Slot has passed and the task is unresolved
    Missed,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Upcoming => "upcoming",
            Urgency::Missed => "missed",
        }
    }
}

/// Caregiver overview urgency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OverviewUrgency {
    Overdue,
    DueSoon,
    Scheduled,
    UpNext,
    UpNextTomorrow,
}

impl OverviewUrgency {
    pub fn label(&self) -> &'static str {
        match self {
            OverviewUrgency::Overdue => "OVERDUE",
            OverviewUrgency::DueSoon => "DUE SOON",
            OverviewUrgency::Scheduled => "Scheduled Routine",
            OverviewUrgency::UpNext => "Up Next",
            OverviewUrgency::UpNextTomorrow => "Up Next (Tomorrow)",
        }
    }
}

/// Time remaining until `time` today, negative once it has passed.
fn until_slot(time: NaiveTime, now: NaiveDateTime) -> Duration {
    now.date().and_time(time) - now
}

/// Classify the patient's next task against the wall clock.
pub fn classify_urgency(task: &DailyTask, now: NaiveDateTime) -> Urgency {
    if task.status == TaskStatus::Missed {
        return Urgency::Missed;
    }
    match task.scheduled_time() {
        Some(time) => classify_time(time, now),
        None => Urgency::Normal,
    }
}

/// Classify a bare time of day against the wall clock.
pub fn classify_time(time: NaiveTime, now: NaiveDateTime) -> Urgency {
    let remaining = until_slot(time, now);
    if remaining < Duration::zero() {
        Urgency::Missed
    } else if remaining < Duration::minutes(DUE_SOON_MINUTES) {
        Urgency::Upcoming
    } else {
        Urgency::Normal
    }
}

/// Classify the overview's next-task time string.
///
/// A value containing [`TOMORROW_MARKER`] skips the numeric comparison. A
/// value that does not parse (e.g. the `--:--` placeholder) reads as scheduled.
pub fn classify_overview(next_task_time: &str, now: NaiveDateTime) -> OverviewUrgency {
    if next_task_time.contains(TOMORROW_MARKER) {
        return OverviewUrgency::UpNextTomorrow;
    }

    let time_part = next_task_time.split_whitespace().next().unwrap_or_default();
    let Some(time) = parse_time_of_day(time_part) else {
        return OverviewUrgency::Scheduled;
    };

    let remaining = until_slot(time, now);
    if remaining < Duration::zero() {
        OverviewUrgency::Overdue
    } else if remaining < Duration::minutes(DUE_SOON_MINUTES) {
        OverviewUrgency::DueSoon
    } else if remaining < Duration::minutes(SCHEDULED_WINDOW_MINUTES) {
        OverviewUrgency::Scheduled
    } else {
        OverviewUrgency::UpNext
    }
}
