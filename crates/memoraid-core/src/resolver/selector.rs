//! Next-task selection for the patient view.

use crate::models::DailyTask;

/// First pending or missed task in time order, or `None` when everything is
/// done for the day. Expects `tasks` already sorted by [`super::sort_by_time`].
pub fn next_task(tasks: &[DailyTask]) -> Option<&DailyTask> {
    tasks.iter().find(|task| task.status.is_actionable())
}

/// Tasks still open for the day, in time order.
pub fn open_tasks(tasks: &[DailyTask]) -> impl Iterator<Item = &DailyTask> {
    tasks.iter().filter(|task| task.status.is_actionable())
}
