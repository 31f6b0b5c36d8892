//! Caregiver dashboard statistics.

use serde::{Deserialize, Serialize};

use super::{Alert, RoutineId};

/// Per-patient counters returned by the caregiver stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientStats {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    /// Link status (`pending`, `active`, `attention`, `alert`)
    #[serde(default)]
    pub status: Option<String>,
    /// Requesting caregiver's level for this patient, e.g. `"Primary"`
    #[serde(default)]
    pub care_level: Option<String>,
    #[serde(default)]
    pub pending_tasks: u32,
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub missed_tasks: u32,
    #[serde(default)]
    pub escalated_tasks: u32,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub active_alerts: u32,
    #[serde(default)]
    pub next_task: Option<String>,
    /// `HH:MM`, or a value carrying the literal `Tomorrow` marker
    #[serde(default)]
    pub next_task_time: Option<String>,
    #[serde(default)]
    pub next_task_id: Option<RoutineId>,
}

impl PatientStats {
    /// Whether the requesting caregiver may edit this patient's routines.
    pub fn can_edit(&self) -> bool {
        self.care_level
            .as_deref()
            .is_some_and(|level| level.to_lowercase().contains("primary"))
    }

    pub fn needs_attention(&self) -> bool {
        matches!(self.status.as_deref(), Some("attention") | Some("alert"))
    }

    pub fn next_task_label(&self) -> &str {
        self.next_task.as_deref().unwrap_or("No more routines")
    }

    pub fn next_task_time_label(&self) -> &str {
        self.next_task_time.as_deref().unwrap_or("--:--")
    }
}

/// Payload of `GET users/caregiver/stats/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaregiverStats {
    #[serde(default)]
    pub patients: Vec<PatientStats>,
    #[serde(default)]
    pub recent_alerts: Vec<Alert>,
    #[serde(default)]
    pub total_active_alerts: u32,
}

impl CaregiverStats {
    pub fn patient(&self, id: i64) -> Option<&PatientStats> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Patients whose link request is still awaiting approval.
    pub fn pending_requests(&self) -> impl Iterator<Item = &PatientStats> {
        self.patients
            .iter()
            .filter(|p| p.status.as_deref() == Some("pending"))
    }

    pub fn attention_count(&self) -> usize {
        self.patients.iter().filter(|p| p.needs_attention()).count()
    }
}
