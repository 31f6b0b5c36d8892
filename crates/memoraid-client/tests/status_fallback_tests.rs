//! Status writes racing another actor's log creation.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use memoraid_client::api::{ApiCall, ApiError, MockCareApi};
use memoraid_client::tasks::{StatusWrite, TaskError, TaskService};
use memoraid_core::models::{Routine, TaskLog, TaskStatus};
use memoraid_core::SessionContext;

fn now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(5 * 3600 + 1800)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 18, 10, 0, 0)
        .unwrap()
}

fn today() -> NaiveDate {
    now().date_naive()
}

fn log(id: i64, routine: i64, status: TaskStatus) -> TaskLog {
    TaskLog {
        id,
        routine,
        date: today(),
        status,
        handled_by: Some(2),
        notes: None,
        routine_name: None,
        routine_time: None,
        routine_icon: None,
    }
}

fn service(api: MockCareApi) -> TaskService<MockCareApi> {
    TaskService::new(Arc::new(api), Arc::new(RwLock::new(SessionContext::default())))
}

fn patches(api: &MockCareApi) -> usize {
    api.count_calls(|c| matches!(c, ApiCall::UpdateLog(..)))
}

#[tokio::test]
async fn test_create_race_issues_exactly_one_patch() {
    // The caregiver logged "missed" between our fetch and our POST.
    let api = MockCareApi::new()
        .with_routines(vec![Routine::daily(1, "Breakfast", "08:00")])
        .with_racing_log(log(50, 1, TaskStatus::Missed));
    let service = service(api);

    let board = service.fetch_today(None, &now()).await.unwrap();
    let task = board.task(1).unwrap().clone();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.log_id.is_none());

    let written = service.complete(None, &task, today()).await.unwrap();
    assert_eq!(written.id, 50);
    assert_eq!(written.status, TaskStatus::Completed);

    let api = service.api();
    assert_eq!(api.count_calls(|c| matches!(c, ApiCall::CreateLog(_))), 1);
    assert_eq!(patches(api), 1);
    assert_eq!(api.logs().len(), 1);

    // After the full re-fetch the task is no longer open.
    let board = service.fetch_today(None, &now()).await.unwrap();
    assert_eq!(board.task(1).unwrap().status, TaskStatus::Completed);
    assert!(board.next_task().is_none());
}

#[tokio::test]
async fn test_known_log_is_patched_directly() {
    let api = MockCareApi::new()
        .with_routines(vec![Routine::daily(1, "Breakfast", "08:00")])
        .with_logs(vec![log(50, 1, TaskStatus::Missed)]);
    let service = service(api);

    let board = service.fetch_today(None, &now()).await.unwrap();
    let task = board.task(1).unwrap().clone();
    service.escalate(Some(4), &task, today()).await.unwrap();

    let api = service.api();
    assert_eq!(api.count_calls(|c| matches!(c, ApiCall::CreateLog(_))), 0);
    assert_eq!(patches(api), 1);
    assert_eq!(api.logs()[0].status, TaskStatus::Escalated);
}

#[tokio::test]
async fn test_failed_create_without_existing_log_surfaces_original_error() {
    let api = MockCareApi::new().with_logs(vec![log(60, 9, TaskStatus::Completed)]);
    api.fail_lists(true);
    let service = service(api);

    // Log 60 belongs to routine 9, so the POST for routine 9 collides; the
    // re-fetch then fails and the POST error is what the caller sees.
    let write = StatusWrite {
        routine: 9,
        log: None,
        status: TaskStatus::Pending,
        date: today(),
        notes: None,
    };
    let err = service.write_status(None, write).await.unwrap_err();
    assert!(matches!(err, TaskError::Api(ApiError::Status { status: 400, .. })));
    assert_eq!(patches(service.api()), 0);
}

#[tokio::test]
async fn test_fallback_only_patches_the_matching_routine() {
    let api = MockCareApi::new()
        .with_logs(vec![log(70, 2, TaskStatus::Completed)])
        .with_racing_log(log(71, 1, TaskStatus::Pending));
    let service = service(api);

    let write = StatusWrite {
        routine: 1,
        log: None,
        status: TaskStatus::Completed,
        date: today(),
        notes: Some("Completed via Overview Quick-Action".into()),
    };
    let written = service.write_status(Some(4), write).await.unwrap();
    assert_eq!(written.id, 71);

    let calls = service.api().calls();
    assert!(calls.iter().any(|c| matches!(c, ApiCall::UpdateLog(71, _))));
    assert!(!calls.iter().any(|c| matches!(c, ApiCall::UpdateLog(70, _))));
}
