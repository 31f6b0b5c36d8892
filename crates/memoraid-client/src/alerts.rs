//! Alert listing and acknowledgment.

use std::sync::Arc;

use memoraid_core::models::{partition_alerts, Alert, AlertId};

use crate::api::{ApiResult, CareApi};

/// Alerts split by status, newest order preserved from the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertBoard {
    pub active: Vec<Alert>,
    pub handled: Vec<Alert>,
}

impl AlertBoard {
    pub fn from_alerts(alerts: Vec<Alert>) -> Self {
        let (active, handled) = partition_alerts(alerts);
        Self { active, handled }
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }
}

pub struct AlertService<A> {
    api: Arc<A>,
}

impl<A> Clone for AlertService<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: CareApi> AlertService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// All alerts, or one patient's.
    pub async fn fetch(&self, patient: Option<i64>) -> ApiResult<AlertBoard> {
        let alerts = self.api.list_alerts(patient).await?;
        Ok(AlertBoard::from_alerts(alerts))
    }

    /// Mark an alert handled, then reload the list.
    pub async fn acknowledge(&self, id: AlertId, patient: Option<i64>) -> ApiResult<AlertBoard> {
        self.api.acknowledge_alert(id).await?;
        tracing::info!(alert = id, "Alert acknowledged");
        self.fetch(patient).await
    }
}
