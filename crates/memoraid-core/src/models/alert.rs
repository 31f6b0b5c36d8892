//! Alert models (SOS and missed-task events).

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::parse_time_of_day;

/// Backend identifier of an alert.
pub type AlertId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Patient-initiated emergency request
    Sos,
    /// Raised by the backend when a routine log stays unresolved
    MissedTask,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Active,
    Handled,
}

/// An event requiring caregiver attention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: AlertId,
    #[serde(default)]
    pub patient: Option<i64>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub routine_name: Option<String>,
    #[serde(default)]
    pub routine_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            AlertKind::Sos => "Emergency Help Request",
            AlertKind::MissedTask => "Missed Care Routine",
        }
    }

    /// Human readable detail line.
    ///
    /// Missed-task alerts render `"<routine> at h:MM AM/PM"` when the routine
    /// fields are present; otherwise the stored message is used with its
    /// legacy prefixes stripped.
    pub fn details(&self) -> String {
        if self.kind == AlertKind::MissedTask {
            if let (Some(name), Some(time)) = (&self.routine_name, &self.routine_time) {
                if let Some(t) = parse_time_of_day(time) {
                    return format!("{} at {}", name, t.format("%-I:%M %p"));
                }
            }
        }
        self.message
            .as_deref()
            .unwrap_or_default()
            .replace("Ack: ", "")
            .replace("Missed Routine: ", "")
    }

    /// Coordinates when the alert was geo-tagged.
    pub fn location(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Request body for creating an alert.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAlert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewAlert {
    /// SOS alert, optionally geo-tagged. Coordinates serialize as `null` when absent.
    pub fn sos(message: impl Into<String>, location: Option<(f64, f64)>) -> Self {
        Self {
            kind: AlertKind::Sos,
            message: message.into(),
            latitude: location.map(|(lat, _)| lat),
            longitude: location.map(|(_, lon)| lon),
        }
    }
}

/// Split alerts into (active, handled), preserving order.
pub fn partition_alerts(alerts: Vec<Alert>) -> (Vec<Alert>, Vec<Alert>) {
    alerts.into_iter().partition(Alert::is_active)
}
