//! In-memory backend for tests.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;

use memoraid_core::models::{
    Alert, AlertId, AlertStatus, CaregiverStats, LogId, NewAlert, NewLog, Routine, RoutineId,
    TaskLog, User,
};
use memoraid_core::validation::RoutineDraft;

use super::{ApiError, ApiResult, CareApi, DayQuery, LogPatch, LoginResponse};

/// A call received by [`MockCareApi`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Login(String),
    RegisterPushToken { token: String, device_id: String },
    ListRoutines(DayQuery),
    CreateRoutine(String),
    UpdateRoutine(RoutineId),
    DeleteRoutine(RoutineId),
    ListLogs(DayQuery),
    CreateLog(NewLog),
    UpdateLog(LogId, LogPatch),
    ListAlerts(Option<i64>),
    CreateAlert(NewAlert),
    AcknowledgeAlert(AlertId),
    CaregiverStats,
}

#[derive(Default)]
struct MockState {
    routines: Vec<Routine>,
    logs: Vec<TaskLog>,
    alerts: Vec<Alert>,
    stats: CaregiverStats,
    user: Option<User>,
    calls: Vec<ApiCall>,
    next_id: i64,
    /// Logs another actor creates just before our POST lands
    racing_logs: Vec<TaskLog>,
    fail_lists: bool,
    fail_alerts: bool,
    alert_latency: Option<Duration>,
}

/// Backend double that stores routines, logs and alerts in memory.
///
/// Log creation enforces the one-log-per-(routine, date) rule with a 400,
/// like the real backend.
#[derive(Default)]
pub struct MockCareApi {
    state: Mutex<MockState>,
}

impl MockCareApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routines(self, routines: Vec<Routine>) -> Self {
        self.lock().routines = routines;
        self
    }

    pub fn with_logs(self, logs: Vec<TaskLog>) -> Self {
        self.lock().logs = logs;
        self
    }

    pub fn with_alerts(self, alerts: Vec<Alert>) -> Self {
        self.lock().alerts = alerts;
        self
    }

    pub fn with_stats(self, stats: CaregiverStats) -> Self {
        self.lock().stats = stats;
        self
    }

    /// User returned by `login`.
    pub fn with_user(self, user: User) -> Self {
        self.lock().user = Some(user);
        self
    }

    /// Simulate a concurrent writer: this log appears right before the next
    /// `create_log` for the same routine and date, making it fail.
    pub fn with_racing_log(self, log: TaskLog) -> Self {
        self.lock().racing_logs.push(log);
        self
    }

    /// Make list endpoints fail with a 500.
    pub fn fail_lists(&self, fail: bool) {
        self.lock().fail_lists = fail;
    }

    /// Make `create_alert` fail with a 503.
    pub fn fail_alerts(&self, fail: bool) {
        self.lock().fail_alerts = fail;
    }

    /// Delay `create_alert` responses.
    pub fn alert_latency(&self, latency: Duration) {
        self.lock().alert_latency = Some(latency);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| matches(c)).count()
    }

    pub fn logs(&self) -> Vec<TaskLog> {
        self.lock().logs.clone()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().alerts.clone()
    }

    pub fn routines(&self) -> Vec<Routine> {
        self.lock().routines.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test poisons the lock; keep serving the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: ApiCall) -> MutexGuard<'_, MockState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }

    fn check_lists(&self) -> ApiResult<()> {
        if self.fail_lists {
            return Err(ApiError::Status {
                status: 500,
                body: "Internal Server Error".into(),
            });
        }
        Ok(())
    }
}

fn on_date(date: Option<NaiveDate>, log: &TaskLog) -> bool {
    date.map_or(true, |d| log.date == d)
}

fn routine_from_draft(id: RoutineId, draft: &RoutineDraft) -> Routine {
    let mut routine = Routine::daily(id, draft.name.clone(), draft.time.clone());
    routine.patient = Some(draft.patient);
    routine.frequency = draft.frequency;
    routine.days_of_week = draft.days_of_week.clone();
    routine.target_date = draft.target_date;
    routine.notes = Some(draft.notes.clone()).filter(|n| !n.is_empty());
    routine.icon = draft.icon.clone();
    routine.is_active = draft.is_active;
    routine.escalation = draft.escalation;
    routine
}

impl CareApi for MockCareApi {
    async fn login(&self, email: &str, _password: &str) -> ApiResult<LoginResponse> {
        let state = self.record(ApiCall::Login(email.to_string()));
        let user = state.user.clone().ok_or(ApiError::Unauthorized)?;
        Ok(LoginResponse {
            access: format!("access-{}", user.id),
            refresh: format!("refresh-{}", user.id),
            user,
        })
    }

    async fn register_push_token(&self, token: &str, device_id: &str) -> ApiResult<()> {
        let _state = self.record(ApiCall::RegisterPushToken {
            token: token.to_string(),
            device_id: device_id.to_string(),
        });
        Ok(())
    }

    async fn list_routines(&self, query: DayQuery) -> ApiResult<Vec<Routine>> {
        let state = self.record(ApiCall::ListRoutines(query));
        state.check_lists()?;
        Ok(state
            .routines
            .iter()
            .filter(|r| query.patient.is_none() || r.patient.is_none() || r.patient == query.patient)
            .cloned()
            .collect())
    }

    async fn create_routine(&self, draft: &RoutineDraft) -> ApiResult<Routine> {
        let mut state = self.record(ApiCall::CreateRoutine(draft.name.clone()));
        let id = state.next_id();
        let routine = routine_from_draft(id, draft);
        state.routines.push(routine.clone());
        Ok(routine)
    }

    async fn update_routine(&self, id: RoutineId, draft: &RoutineDraft) -> ApiResult<Routine> {
        let mut state = self.record(ApiCall::UpdateRoutine(id));
        let slot = state
            .routines
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: "Not found.".into(),
            })?;
        let created_at = slot.created_at;
        *slot = routine_from_draft(id, draft);
        slot.created_at = created_at;
        Ok(slot.clone())
    }

    async fn delete_routine(&self, id: RoutineId) -> ApiResult<()> {
        let mut state = self.record(ApiCall::DeleteRoutine(id));
        state.routines.retain(|r| r.id != id);
        Ok(())
    }

    async fn list_logs(&self, query: DayQuery) -> ApiResult<Vec<TaskLog>> {
        let state = self.record(ApiCall::ListLogs(query));
        state.check_lists()?;
        Ok(state
            .logs
            .iter()
            .filter(|l| on_date(query.date, l))
            .cloned()
            .collect())
    }

    async fn create_log(&self, log: &NewLog) -> ApiResult<TaskLog> {
        let mut state = self.record(ApiCall::CreateLog(log.clone()));

        if let Some(pos) = state
            .racing_logs
            .iter()
            .position(|l| l.routine == log.routine && l.date == log.date)
        {
            let racer = state.racing_logs.remove(pos);
            state.logs.push(racer);
        }

        if state
            .logs
            .iter()
            .any(|l| l.routine == log.routine && l.date == log.date)
        {
            return Err(ApiError::Status {
                status: 400,
                body: r#"{"non_field_errors":["The fields routine, date must make a unique set."]}"#
                    .into(),
            });
        }

        let created = TaskLog {
            id: state.next_id(),
            routine: log.routine,
            date: log.date,
            status: log.status,
            handled_by: log.handled_by,
            notes: log.notes.clone(),
            routine_name: None,
            routine_time: None,
            routine_icon: None,
        };
        state.logs.push(created.clone());
        Ok(created)
    }

    async fn update_log(&self, id: LogId, patch: &LogPatch) -> ApiResult<TaskLog> {
        let mut state = self.record(ApiCall::UpdateLog(id, patch.clone()));
        let log = state
            .logs
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: "Not found.".into(),
            })?;
        log.status = patch.status;
        if patch.notes.is_some() {
            log.notes = patch.notes.clone();
        }
        Ok(log.clone())
    }

    async fn list_alerts(&self, patient: Option<i64>) -> ApiResult<Vec<Alert>> {
        let state = self.record(ApiCall::ListAlerts(patient));
        state.check_lists()?;
        Ok(state
            .alerts
            .iter()
            .filter(|a| patient.is_none() || a.patient == patient)
            .cloned()
            .collect())
    }

    async fn create_alert(&self, alert: &NewAlert) -> ApiResult<Alert> {
        let latency = {
            let state = self.record(ApiCall::CreateAlert(alert.clone()));
            state.alert_latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        if state.fail_alerts {
            return Err(ApiError::Status {
                status: 503,
                body: "Service Unavailable".into(),
            });
        }
        let created = Alert {
            id: state.next_id(),
            patient: None,
            patient_name: None,
            kind: alert.kind,
            status: AlertStatus::Active,
            message: Some(alert.message.clone()),
            latitude: alert.latitude,
            longitude: alert.longitude,
            routine_name: None,
            routine_time: None,
            created_at: None,
        };
        state.alerts.push(created.clone());
        Ok(created)
    }

    async fn acknowledge_alert(&self, id: AlertId) -> ApiResult<()> {
        let mut state = self.record(ApiCall::AcknowledgeAlert(id));
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.status = AlertStatus::Handled;
                Ok(())
            }
            None => Err(ApiError::Status {
                status: 404,
                body: "Not found.".into(),
            }),
        }
    }

    async fn caregiver_stats(&self) -> ApiResult<CaregiverStats> {
        let state = self.record(ApiCall::CaregiverStats);
        state.check_lists()?;
        Ok(state.stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let api = MockCareApi::new();
        api.register_push_token("fcm-1", "device-1").await.unwrap();
        api.delete_routine(7).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                ApiCall::RegisterPushToken {
                    token: "fcm-1".into(),
                    device_id: "device-1".into(),
                },
                ApiCall::DeleteRoutine(7),
            ]
        );
    }
}
