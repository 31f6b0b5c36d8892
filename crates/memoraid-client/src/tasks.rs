//! Task service: fetch and resolve a day, change task status, manage routines.
//!
//! Status writes never touch local state. Callers re-fetch the day after
//! every change so the board always mirrors the server.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use thiserror::Error;

use memoraid_core::lifecycle::{transition, TaskAction, TransitionError};
use memoraid_core::models::{
    find_log, DailyTask, LogId, NewLog, Routine, RoutineId, TaskLog, TaskStatus, TaskSummary,
};
use memoraid_core::resolver::{classify_urgency, next_task, TaskResolver, Urgency};
use memoraid_core::validation::{RoutineDraft, ValidationError};

use crate::api::{ApiError, CareApi, DayQuery, LogPatch};
use crate::auth::SharedSession;

pub const QUICK_ACTION_NOTE: &str = "Completed via Overview Quick-Action";

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Only primary caregivers can change routines.")]
    PermissionDenied,

    #[error("Session lock poisoned")]
    LockPoisoned,
}

pub type TaskResult<T> = Result<T, TaskError>;

/// One resolved day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBoard {
    pub date: Option<NaiveDate>,
    pub tasks: Vec<DailyTask>,
}

impl DayBoard {
    pub fn next_task(&self) -> Option<&DailyTask> {
        next_task(&self.tasks)
    }

    pub fn urgency(&self, now: NaiveDateTime) -> Option<Urgency> {
        self.next_task().map(|task| classify_urgency(task, now))
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary::from_tasks(&self.tasks)
    }

    pub fn task(&self, routine_id: RoutineId) -> Option<&DailyTask> {
        self.tasks.iter().find(|t| t.routine_id == routine_id)
    }
}

/// Where a status write should land.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusWrite {
    pub routine: RoutineId,
    pub log: Option<LogId>,
    pub status: TaskStatus,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

pub struct TaskService<A> {
    api: Arc<A>,
    session: SharedSession,
}

impl<A> Clone for TaskService<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            session: Arc::clone(&self.session),
        }
    }
}

impl<A: CareApi> TaskService<A> {
    pub fn new(api: Arc<A>, session: SharedSession) -> Self {
        Self { api, session }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Today's board for the patient view.
    pub async fn fetch_today(
        &self,
        patient: Option<i64>,
        now: &DateTime<FixedOffset>,
    ) -> TaskResult<DayBoard> {
        self.fetch_with(patient, TaskResolver::today(now)).await
    }

    /// Today's board for the caregiver tracker, including logs of deleted routines.
    pub async fn fetch_tracker(
        &self,
        patient: Option<i64>,
        now: &DateTime<FixedOffset>,
    ) -> TaskResult<DayBoard> {
        self.fetch_with(patient, TaskResolver::today(now).with_orphaned_logs(true))
            .await
    }

    /// Any date on the caregiver calendar.
    pub async fn fetch_calendar(
        &self,
        patient: Option<i64>,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> TaskResult<DayBoard> {
        let resolver = TaskResolver::for_date(date, offset);
        let (routines, logs) = self.fetch_raw(DayQuery::new(patient, date)).await?;
        Ok(DayBoard {
            date: Some(date),
            tasks: resolver.resolve_calendar(&routines, &logs),
        })
    }

    async fn fetch_with(&self, patient: Option<i64>, resolver: TaskResolver) -> TaskResult<DayBoard> {
        let date = resolver.date();
        let (routines, logs) = self.fetch_raw(DayQuery::new(patient, date)).await?;
        let tasks = resolver.resolve(&routines, &logs);
        tracing::debug!(%date, tasks = tasks.len(), "Resolved day");
        Ok(DayBoard {
            date: Some(date),
            tasks,
        })
    }

    /// Routines and logs together; either failing fails the whole fetch.
    async fn fetch_raw(&self, query: DayQuery) -> TaskResult<(Vec<Routine>, Vec<TaskLog>)> {
        let (routines, logs) =
            tokio::try_join!(self.api.list_routines(query), self.api.list_logs(query))?;
        Ok((routines, logs))
    }

    /// Apply an action to a resolved task for `date`.
    pub async fn apply(
        &self,
        patient: Option<i64>,
        task: &DailyTask,
        action: TaskAction,
        date: NaiveDate,
    ) -> TaskResult<TaskLog> {
        let status = transition(task.status, action)?;
        self.write_status(
            patient,
            StatusWrite {
                routine: task.routine_id,
                log: task.log_id,
                status,
                date,
                notes: None,
            },
        )
        .await
    }

    pub async fn complete(
        &self,
        patient: Option<i64>,
        task: &DailyTask,
        date: NaiveDate,
    ) -> TaskResult<TaskLog> {
        self.apply(patient, task, TaskAction::Complete, date).await
    }

    pub async fn escalate(
        &self,
        patient: Option<i64>,
        task: &DailyTask,
        date: NaiveDate,
    ) -> TaskResult<TaskLog> {
        self.apply(patient, task, TaskAction::Escalate, date).await
    }

    pub async fn reopen(
        &self,
        patient: Option<i64>,
        task: &DailyTask,
        date: NaiveDate,
    ) -> TaskResult<TaskLog> {
        self.apply(patient, task, TaskAction::Reopen, date).await
    }

    /// Persist a status: PATCH the known log, otherwise POST a new one.
    ///
    /// If the POST fails (typically because another actor created the log
    /// first), re-fetch the day's logs and PATCH the one found, exactly once.
    /// When no log turns up the original POST error is returned.
    pub async fn write_status(&self, patient: Option<i64>, write: StatusWrite) -> TaskResult<TaskLog> {
        let patch = LogPatch {
            status: write.status,
            notes: write.notes.clone(),
        };

        if let Some(log_id) = write.log {
            let log = self.api.update_log(log_id, &patch).await?;
            tracing::info!(routine = write.routine, log = log_id, status = %write.status.as_str(), "Log updated");
            return Ok(log);
        }

        let mut new_log = NewLog::new(write.routine, write.date, write.status);
        new_log.notes = write.notes.clone();

        let create_err = match self.api.create_log(&new_log).await {
            Ok(log) => {
                tracing::info!(routine = write.routine, status = %write.status.as_str(), "Log created");
                return Ok(log);
            }
            Err(e) => e,
        };

        tracing::warn!(
            routine = write.routine,
            error = %create_err,
            "Log create failed, retrying as update"
        );

        let logs = match self.api.list_logs(DayQuery::new(patient, write.date)).await {
            Ok(logs) => logs,
            Err(e) => {
                tracing::warn!(error = %e, "Could not re-fetch logs for fallback");
                return Err(create_err.into());
            }
        };

        match find_log(&logs, write.routine) {
            Some(existing) => {
                let log = self.api.update_log(existing.id, &patch).await?;
                tracing::info!(routine = write.routine, log = existing.id, "Fallback update applied");
                Ok(log)
            }
            None => Err(create_err.into()),
        }
    }

    /// Create a routine after validation; primary caregivers only.
    pub async fn create_routine(&self, draft: RoutineDraft, now: NaiveDateTime) -> TaskResult<Routine> {
        self.require_primary()?;
        let draft = draft.validate(now)?;
        let routine = self.api.create_routine(&draft).await?;
        tracing::info!(routine = routine.id, "Routine created");
        Ok(routine)
    }

    pub async fn update_routine(
        &self,
        id: RoutineId,
        draft: RoutineDraft,
        now: NaiveDateTime,
    ) -> TaskResult<Routine> {
        self.require_primary()?;
        let draft = draft.validate(now)?;
        let routine = self.api.update_routine(id, &draft).await?;
        tracing::info!(routine = id, "Routine updated");
        Ok(routine)
    }

    pub async fn delete_routine(&self, id: RoutineId) -> TaskResult<()> {
        self.require_primary()?;
        self.api.delete_routine(id).await?;
        tracing::info!(routine = id, "Routine deleted");
        Ok(())
    }

    fn require_primary(&self) -> TaskResult<()> {
        let session = self.session.read().map_err(|_| TaskError::LockPoisoned)?;
        if session.user().is_some_and(|u| u.is_primary_caregiver()) {
            Ok(())
        } else {
            Err(TaskError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;

    use chrono::TimeZone;
    use memoraid_core::models::{AccountStatus, CareLevel, CaregiverProfile, Role, User};
    use memoraid_core::{Database, SessionContext};

    use crate::api::{ApiCall, MockCareApi};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 18, 10, 0, 0)
            .unwrap()
    }

    fn session_for(level: Option<CareLevel>) -> SharedSession {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionContext::default();
        let user = User {
            id: 2,
            full_name: "Ravi".into(),
            email: "ravi@example.com".into(),
            role: Role::Caregiver,
            status: AccountStatus::Active,
            caregiver_profile: level.map(|level| CaregiverProfile {
                relationship: None,
                level,
                phone_number: None,
                city: None,
            }),
            patient_profile: None,
        };
        session.establish(&db, "tok".into(), "ref".into(), user).unwrap();
        Arc::new(RwLock::new(session))
    }

    fn service(api: MockCareApi) -> TaskService<MockCareApi> {
        TaskService::new(Arc::new(api), session_for(Some(CareLevel::Primary)))
    }

    #[tokio::test]
    async fn test_fetch_today_resolves_board() {
        let api = MockCareApi::new().with_routines(vec![
            Routine::daily(2, "Dinner", "20:00"),
            Routine::daily(1, "Breakfast", "08:00"),
        ]);
        let board = service(api).fetch_today(None, &now()).await.unwrap();

        assert_eq!(board.tasks.len(), 2);
        assert_eq!(board.next_task().unwrap().routine_id, 1);
        assert_eq!(board.urgency(now().naive_local()), Some(Urgency::Missed));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_partial() {
        let api = MockCareApi::new().with_routines(vec![Routine::daily(1, "Breakfast", "08:00")]);
        api.fail_lists(true);
        let err = service(api).fetch_today(None, &now()).await.unwrap_err();
        assert!(matches!(err, TaskError::Api(ApiError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_complete_without_log_posts() {
        let service = service(MockCareApi::new().with_routines(vec![Routine::daily(1, "Breakfast", "08:00")]));
        let board = service.fetch_today(None, &now()).await.unwrap();
        let task = board.task(1).unwrap();

        let log = service.complete(None, task, now().date_naive()).await.unwrap();
        assert_eq!(log.status, TaskStatus::Completed);
        assert_eq!(service.api().count_calls(|c| matches!(c, ApiCall::CreateLog(_))), 1);
        assert_eq!(service.api().count_calls(|c| matches!(c, ApiCall::UpdateLog(..))), 0);
    }

    #[tokio::test]
    async fn test_escalated_task_rejects_actions_before_network() {
        let service = service(MockCareApi::new());
        let mut task = DailyTask::from_routine(&Routine::daily(1, "Breakfast", "08:00"), None);
        task.status = TaskStatus::Escalated;

        let err = service.complete(None, &task, now().date_naive()).await.unwrap_err();
        assert!(matches!(err, TaskError::Transition(_)));
        assert!(service.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_routine_changes_need_primary_caregiver() {
        let api = Arc::new(MockCareApi::new());
        let secondary = TaskService::new(Arc::clone(&api), session_for(Some(CareLevel::Secondary)));

        let mut draft = RoutineDraft::new(4);
        draft.name = "Walk".into();
        draft.time = "18:00".into();

        let err = secondary
            .create_routine(draft.clone(), now().naive_local())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::PermissionDenied));
        assert!(api.calls().is_empty());

        let primary = TaskService::new(Arc::clone(&api), session_for(Some(CareLevel::Primary)));
        let routine = primary.create_routine(draft, now().naive_local()).await.unwrap();
        assert_eq!(routine.time, "18:00:00");
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_network() {
        let service = service(MockCareApi::new());
        let mut draft = RoutineDraft::new(4);
        draft.name = "Walk".into();
        draft.time = "07:00".into();

        let err = service
            .create_routine(draft, now().naive_local())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(ValidationError::TimeInPast)));
        assert!(service.api().calls().is_empty());
    }
}
