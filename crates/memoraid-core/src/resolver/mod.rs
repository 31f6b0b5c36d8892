//! Task status resolver.
//!
//! Pipeline: Schedule Filter → Routine/Log Merge → Time Ordering → Next-Task Selection → Urgency

mod schedule;
mod selector;
mod urgency;

pub use schedule::*;
pub use selector::*;
pub use urgency::*;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone};

use crate::models::{find_log, DailyTask, Routine, TaskLog};

/// Merges a date's routines with its logs into an ordered task list.
#[derive(Debug, Clone, Copy)]
pub struct TaskResolver {
    filter: ScheduleFilter,
    include_orphaned: bool,
}

impl TaskResolver {
    /// Resolver for the calendar date of `now`, read in `now`'s time zone.
    pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let offset = now.offset().fix();
        Self::for_date(now.date_naive(), offset)
    }

    /// Resolver for an explicit date and local offset.
    pub fn for_date(date: NaiveDate, offset: FixedOffset) -> Self {
        Self {
            filter: ScheduleFilter::new(date, offset),
            include_orphaned: false,
        }
    }

    /// Also list completed/escalated logs whose routine was deleted.
    pub fn with_orphaned_logs(mut self, include: bool) -> Self {
        self.include_orphaned = include;
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.filter.date()
    }

    pub fn schedule(&self) -> &ScheduleFilter {
        &self.filter
    }

    /// Resolve the day's task list.
    ///
    /// Each due routine takes its log's status, or `pending` when no log
    /// exists. The result is sorted by time-of-day string.
    pub fn resolve(&self, routines: &[Routine], logs: &[TaskLog]) -> Vec<DailyTask> {
        let mut tasks: Vec<DailyTask> = routines
            .iter()
            .filter(|routine| self.filter.is_due(routine))
            .map(|routine| DailyTask::from_routine(routine, find_log(logs, routine.id)))
            .collect();

        if self.include_orphaned {
            tasks.extend(
                logs.iter()
                    .filter(|log| log.status.is_resolved())
                    .filter(|log| !routines.iter().any(|r| r.id == log.routine))
                    .map(DailyTask::from_log),
            );
        }

        sort_by_time(&mut tasks);
        tasks
    }

    /// Calendar view of a date: every log becomes a task (including logs of
    /// deleted routines), plus a pending task for each routine without a log.
    ///
    /// Routines are expected to be pre-filtered for the date by the backend.
    pub fn resolve_calendar(&self, routines: &[Routine], logs: &[TaskLog]) -> Vec<DailyTask> {
        let mut tasks: Vec<DailyTask> = logs.iter().map(DailyTask::from_log).collect();

        // Logs of live routines are not historical; restore the routine's fields.
        for task in tasks.iter_mut() {
            if let Some(routine) = routines.iter().find(|r| r.id == task.routine_id) {
                let log_id = task.log_id;
                let status = task.status;
                *task = DailyTask::from_routine(routine, None);
                task.log_id = log_id;
                task.status = status;
            }
        }

        tasks.extend(
            routines
                .iter()
                .filter(|routine| find_log(logs, routine.id).is_none())
                .map(|routine| DailyTask::from_routine(routine, None)),
        );

        sort_by_time(&mut tasks);
        tasks
    }
}

/// Stable ascending sort by time-of-day string.
pub fn sort_by_time(tasks: &mut [DailyTask]) {
    tasks.sort_by(|a, b| a.time_key().cmp(b.time_key()));
}
