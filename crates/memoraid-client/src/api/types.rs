//! Request and response bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use memoraid_core::models::{AlertStatus, EscalationPolicy, Frequency, TaskStatus, User};
use memoraid_core::validation::RoutineDraft;

/// Body for `POST users/login/`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct PushTokenRequest<'a> {
    pub token: &'a str,
    pub device_id: &'a str,
}

/// Body for `PATCH logs/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogPatch {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LogPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status,
            notes: None,
        }
    }
}

/// Body for `PATCH routines/{id}/`: the editable fields only. The owning
/// patient and a one-off target date are fixed once created.
#[derive(Debug, Serialize)]
pub(crate) struct RoutineEdit<'a> {
    pub name: &'a str,
    pub time: &'a str,
    pub frequency: Frequency,
    pub days_of_week: &'a [u8],
    pub notes: &'a str,
    pub icon: &'a str,
    pub is_active: bool,
    #[serde(flatten)]
    pub escalation: EscalationPolicy,
}

impl<'a> From<&'a RoutineDraft> for RoutineEdit<'a> {
    fn from(draft: &'a RoutineDraft) -> Self {
        Self {
            name: &draft.name,
            time: &draft.time,
            frequency: draft.frequency,
            days_of_week: &draft.days_of_week,
            notes: &draft.notes,
            icon: &draft.icon,
            is_active: draft.is_active,
            escalation: draft.escalation,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AlertPatch {
    pub status: AlertStatus,
}

/// Filter for the per-day list endpoints.
///
/// Patients omit `patient`; the backend scopes the list to themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayQuery {
    pub patient: Option<i64>,
    pub date: Option<NaiveDate>,
}

impl DayQuery {
    pub fn new(patient: Option<i64>, date: NaiveDate) -> Self {
        Self {
            patient,
            date: Some(date),
        }
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(patient) = self.patient {
            params.push(("patient_id", patient.to_string()));
        }
        if let Some(date) = self.date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        params
    }
}
