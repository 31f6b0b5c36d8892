//! `reqwest` implementation of [`CareApi`].

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use memoraid_core::models::{
    Alert, AlertId, AlertStatus, CaregiverStats, LogId, NewAlert, NewLog, Routine, RoutineId,
    TaskLog,
};
use memoraid_core::validation::RoutineDraft;

use super::types::{AlertPatch, LoginRequest, PushTokenRequest, RoutineEdit};
use super::{ApiError, ApiResult, CareApi, DayQuery, LogPatch, LoginResponse};
use crate::auth::SharedSession;
use crate::config::ClientConfig;

const ROUTINES: &str = "users/caregiver/routines/";
const LOGS: &str = "users/caregiver/logs/";
const ALERTS: &str = "users/caregiver/alerts/";

/// HTTP client for the Memoraid backend.
///
/// Every request reads the access token from the shared session, so a
/// login or logout takes effect on the next call.
pub struct HttpCareApi {
    base_url: String,
    client: reqwest::Client,
    session: SharedSession,
    timeout_secs: u64,
}

impl HttpCareApi {
    pub fn new(config: &ClientConfig, session: SharedSession) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url(),
            client,
            session,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let token = self
            .session
            .read()
            .ok()
            .and_then(|session| session.access_token().map(str::to_string));

        let builder = self.client.request(method, &url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => {
                tracing::debug!(url = %url, "No access token for request");
                builder
            }
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                ApiError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else {
                ApiError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "Authentication failed - token may be invalid or expired");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        self.send(builder)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::ResponseParsing(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> ApiResult<T> {
        tracing::debug!(path, "GET");
        self.json(self.request(Method::GET, path).query(params)).await
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        tracing::debug!(path, method = %method, "write");
        self.json(self.request(method, path).json(body)).await
    }

    async fn write_discard<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<()> {
        tracing::debug!(path, method = %method, "write");
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await?;
        Ok(())
    }
}

impl CareApi for HttpCareApi {
    async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = LoginRequest { email, password };
        self.write(Method::POST, "users/login/", &body).await
    }

    async fn register_push_token(&self, token: &str, device_id: &str) -> ApiResult<()> {
        let body = PushTokenRequest { token, device_id };
        self.write_discard(Method::POST, "users/fcm-token/", Some(&body))
            .await
    }

    async fn list_routines(&self, query: DayQuery) -> ApiResult<Vec<Routine>> {
        self.get(ROUTINES, &query.params()).await
    }

    async fn create_routine(&self, draft: &RoutineDraft) -> ApiResult<Routine> {
        self.write(Method::POST, ROUTINES, draft).await
    }

    async fn update_routine(&self, id: RoutineId, draft: &RoutineDraft) -> ApiResult<Routine> {
        let body = RoutineEdit::from(draft);
        self.write(Method::PATCH, &format!("{}{}/", ROUTINES, id), &body)
            .await
    }

    async fn delete_routine(&self, id: RoutineId) -> ApiResult<()> {
        self.write_discard::<()>(Method::DELETE, &format!("{}{}/", ROUTINES, id), None)
            .await
    }

    async fn list_logs(&self, query: DayQuery) -> ApiResult<Vec<TaskLog>> {
        self.get(LOGS, &query.params()).await
    }

    async fn create_log(&self, log: &NewLog) -> ApiResult<TaskLog> {
        self.write(Method::POST, LOGS, log).await
    }

    async fn update_log(&self, id: LogId, patch: &LogPatch) -> ApiResult<TaskLog> {
        self.write(Method::PATCH, &format!("{}{}/", LOGS, id), patch)
            .await
    }

    async fn list_alerts(&self, patient: Option<i64>) -> ApiResult<Vec<Alert>> {
        let params: Vec<(&'static str, String)> = patient
            .map(|id| ("patient_id", id.to_string()))
            .into_iter()
            .collect();
        self.get(ALERTS, &params).await
    }

    async fn create_alert(&self, alert: &NewAlert) -> ApiResult<Alert> {
        self.write(Method::POST, ALERTS, alert).await
    }

    async fn acknowledge_alert(&self, id: AlertId) -> ApiResult<()> {
        let body = AlertPatch {
            status: AlertStatus::Handled,
        };
        self.write_discard(Method::PATCH, &format!("{}{}/", ALERTS, id), Some(&body))
            .await
    }

    async fn caregiver_stats(&self) -> ApiResult<CaregiverStats> {
        self.get("users/caregiver/stats/", &[]).await
    }
}
