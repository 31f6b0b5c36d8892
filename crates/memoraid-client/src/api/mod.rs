//! Memoraid REST API seam.
//!
//! Services are generic over [`CareApi`]; production uses [`HttpCareApi`],
//! tests use [`MockCareApi`].

mod http;
mod mock;
mod types;

pub use http::*;
pub use mock::*;
pub use types::*;

use std::future::Future;

use thiserror::Error;

use memoraid_core::models::{
    Alert, AlertId, CaregiverStats, LogId, NewAlert, NewLog, Routine, RoutineId, TaskLog,
};
use memoraid_core::validation::RoutineDraft;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Cannot connect to Memoraid server at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Authentication failed - token may be invalid or expired")]
    Unauthorized,

    #[error("Server error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

impl ApiError {
    /// Status code returned by the server, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Calls the dashboards make against the backend.
pub trait CareApi: Send + Sync {
    /// `POST users/login/`
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<LoginResponse>> + Send;

    /// `POST users/fcm-token/`
    fn register_push_token(
        &self,
        token: &str,
        device_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// `GET users/caregiver/routines/?patient_id&date`
    fn list_routines(&self, query: DayQuery)
        -> impl Future<Output = ApiResult<Vec<Routine>>> + Send;

    fn create_routine(
        &self,
        draft: &RoutineDraft,
    ) -> impl Future<Output = ApiResult<Routine>> + Send;

    fn update_routine(
        &self,
        id: RoutineId,
        draft: &RoutineDraft,
    ) -> impl Future<Output = ApiResult<Routine>> + Send;

    fn delete_routine(&self, id: RoutineId) -> impl Future<Output = ApiResult<()>> + Send;

    /// `GET users/caregiver/logs/?patient_id&date`
    fn list_logs(&self, query: DayQuery) -> impl Future<Output = ApiResult<Vec<TaskLog>>> + Send;

    /// `POST users/caregiver/logs/`; fails when a log already exists for the pair.
    fn create_log(&self, log: &NewLog) -> impl Future<Output = ApiResult<TaskLog>> + Send;

    /// `PATCH users/caregiver/logs/{id}/`
    fn update_log(
        &self,
        id: LogId,
        patch: &LogPatch,
    ) -> impl Future<Output = ApiResult<TaskLog>> + Send;

    /// `GET users/caregiver/alerts/?patient_id`
    fn list_alerts(
        &self,
        patient: Option<i64>,
    ) -> impl Future<Output = ApiResult<Vec<Alert>>> + Send;

    fn create_alert(&self, alert: &NewAlert) -> impl Future<Output = ApiResult<Alert>> + Send;

    /// `PATCH users/caregiver/alerts/{id}/` with `{status: "handled"}`
    fn acknowledge_alert(&self, id: AlertId) -> impl Future<Output = ApiResult<()>> + Send;

    /// `GET users/caregiver/stats/`
    fn caregiver_stats(&self) -> impl Future<Output = ApiResult<CaregiverStats>> + Send;
}
