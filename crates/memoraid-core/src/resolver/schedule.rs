//! Which routines are due on a given date.

use chrono::{FixedOffset, NaiveDate};

use crate::models::Routine;

/// Decides whether a routine belongs on a date's task list.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleFilter {
    date: NaiveDate,
    offset: FixedOffset,
}

impl ScheduleFilter {
    /// `offset` is the caller's local offset, used to read creation timestamps
    /// as wall-clock time.
    pub fn new(date: NaiveDate, offset: FixedOffset) -> Self {
        Self { date, offset }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Active, scheduled on the date, and not created after its own slot.
    pub fn is_due(&self, routine: &Routine) -> bool {
        routine.is_active && routine.applies_on(self.date) && !self.created_after_slot(routine)
    }

    /// A routine created on the date after its scheduled time does not show up
    /// that day, so a late-afternoon addition is never born overdue.
    pub fn created_after_slot(&self, routine: &Routine) -> bool {
        let (Some(created_at), Some(scheduled)) = (routine.created_at, routine.scheduled_time())
        else {
            return false;
        };

        let created_local = created_at.with_timezone(&self.offset).naive_local();
        created_local.date() == self.date && created_local > self.date.and_time(scheduled)
    }
}
