//! Property tests for the resolver and next-task selector.

use chrono::{FixedOffset, NaiveDate};
use proptest::prelude::*;

use memoraid_core::lifecycle::{transition, TaskAction};
use memoraid_core::models::{find_log, Routine, TaskLog, TaskStatus};
use memoraid_core::resolver::{next_task, TaskResolver};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Pending),
        Just(TaskStatus::Completed),
        Just(TaskStatus::Missed),
        Just(TaskStatus::Escalated),
    ]
}

fn action_strategy() -> impl Strategy<Value = TaskAction> {
    prop_oneof![
        Just(TaskAction::Complete),
        Just(TaskAction::Escalate),
        Just(TaskAction::Reopen),
        Just(TaskAction::MarkMissed),
    ]
}

/// Up to 12 daily routines with random times, each optionally logged.
fn day_strategy() -> impl Strategy<Value = (Vec<Routine>, Vec<TaskLog>)> {
    prop::collection::vec(
        (0u32..24, 0u32..60, prop::option::of(status_strategy())),
        0..12,
    )
    .prop_map(|slots| {
        let mut routines = Vec::new();
        let mut logs = Vec::new();
        for (idx, (h, m, status)) in slots.into_iter().enumerate() {
            let id = idx as i64 + 1;
            routines.push(Routine::daily(id, format!("Task {}", id), format!("{:02}:{:02}", h, m)));
            if let Some(status) = status {
                logs.push(TaskLog {
                    id: 100 + id,
                    routine: id,
                    date: date(),
                    status,
                    handled_by: None,
                    notes: None,
                    routine_name: None,
                    routine_time: None,
                    routine_icon: None,
                });
            }
        }
        (routines, logs)
    })
}

fn resolver() -> TaskResolver {
    TaskResolver::for_date(date(), FixedOffset::east_opt(0).unwrap())
}

proptest! {
    #[test]
    fn status_is_pending_iff_no_log((routines, logs) in day_strategy()) {
        for task in resolver().resolve(&routines, &logs) {
            match find_log(&logs, task.routine_id) {
                Some(log) => prop_assert_eq!(task.status, log.status),
                None => prop_assert_eq!(task.status, TaskStatus::Pending),
            }
        }
    }

    #[test]
    fn resolved_tasks_are_sorted((routines, logs) in day_strategy()) {
        let tasks = resolver().resolve(&routines, &logs);
        for pair in tasks.windows(2) {
            prop_assert!(pair[0].time_key() <= pair[1].time_key());
        }
    }

    #[test]
    fn next_task_is_never_resolved((routines, logs) in day_strategy()) {
        let tasks = resolver().resolve(&routines, &logs);
        match next_task(&tasks) {
            Some(task) => {
                prop_assert!(task.status.is_actionable());
                // Nothing actionable comes before it.
                let position = tasks.iter().position(|t| t.routine_id == task.routine_id).unwrap();
                prop_assert!(tasks[..position].iter().all(|t| t.status.is_resolved()));
            }
            None => prop_assert!(tasks.iter().all(|t| t.status.is_resolved())),
        }
    }

    #[test]
    fn escalated_never_leaves(action in action_strategy()) {
        prop_assert!(transition(TaskStatus::Escalated, action).is_err());
    }

    #[test]
    fn successful_transition_lands_on_target(from in status_strategy(), action in action_strategy()) {
        if let Ok(to) = transition(from, action) {
            prop_assert_eq!(to, action.target());
        }
    }
}
