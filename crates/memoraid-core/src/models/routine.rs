//! Routine models.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::parse_time_of_day;

/// Backend identifier of a routine.
pub type RoutineId = i64;

/// How often a routine recurs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day
    Daily,
    /// On the weekdays listed in `days_of_week`
    Weekly,
    /// Only on `target_date`
    Once,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Once => "once",
        }
    }
}

/// Escalation settings attached to a routine.
///
/// The backend scheduler uses these to raise repeated missed-task alerts;
/// the client only displays and edits them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// Minutes between repeated alerts
    #[serde(default = "default_alert_interval")]
    pub alert_interval: u32,
    /// Minutes the patient has to respond before escalation
    #[serde(default = "default_response_window")]
    pub max_response_window: u32,
    #[serde(default = "default_true")]
    pub escalation_enabled: bool,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            alert_interval: default_alert_interval(),
            max_response_window: default_response_window(),
            escalation_enabled: true,
        }
    }
}

fn default_alert_interval() -> u32 {
    5
}

fn default_response_window() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_icon() -> String {
    "activity".to_string()
}

/// A scheduled care activity owned by a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Routine {
    pub id: RoutineId,
    /// Owning patient (user id)
    #[serde(default)]
    pub patient: Option<i64>,
    pub name: String,
    /// Time of day, `HH:MM` or `HH:MM:SS`
    pub time: String,
    pub frequency: Frequency,
    /// Weekday indices, Monday = 0 .. Sunday = 6
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    #[serde(default, deserialize_with = "super::empty_string_as_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(flatten)]
    pub escalation: EscalationPolicy,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

impl Routine {
    /// Create a daily routine (mostly useful for tests and drafts).
    pub fn daily(id: RoutineId, name: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            id,
            patient: None,
            name: name.into(),
            time: time.into(),
            frequency: Frequency::Daily,
            days_of_week: (0..7).collect(),
            target_date: None,
            notes: None,
            icon: default_icon(),
            is_active: true,
            escalation: EscalationPolicy::default(),
            created_at: None,
        }
    }

    /// Parsed scheduled time, if the stored string is well formed.
    pub fn scheduled_time(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.time)
    }

    /// Sort key used for ordering tasks.
    pub fn time_key(&self) -> &str {
        if self.time.is_empty() {
            "00:00"
        } else {
            &self.time
        }
    }

    /// Whether the routine is scheduled on `date` according to its frequency.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => {
                let weekday = date.weekday().num_days_from_monday() as u8;
                self.days_of_week.contains(&weekday)
            }
            Frequency::Once => self.target_date == Some(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_uses_monday_zero() {
        let mut routine = Routine::daily(1, "Walk", "09:00");
        routine.frequency = Frequency::Weekly;
        routine.days_of_week = vec![0, 2];

        // 2026-10-19 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();

        assert!(routine.applies_on(monday));
        assert!(!routine.applies_on(tuesday));
        assert!(routine.applies_on(wednesday));
    }

    #[test]
    fn test_once_matches_target_date_only() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let mut routine = Routine::daily(2, "Dentist", "11:00");
        routine.frequency = Frequency::Once;
        routine.target_date = Some(date);

        assert!(routine.applies_on(date));
        assert!(!routine.applies_on(date.succ_opt().unwrap()));
    }

    #[test]
    fn test_deserialize_backend_payload() {
        let json = r#"{
            "id": 7,
            "patient": 3,
            "name": "Morning pills",
            "time": "08:00:00",
            "frequency": "once",
            "days_of_week": [],
            "target_date": "",
            "notes": null,
            "is_active": true,
            "alert_interval": 10,
            "max_response_window": 45,
            "escalation_enabled": false,
            "created_at": "2026-10-18T06:15:00Z"
        }"#;

        let routine: Routine = serde_json::from_str(json).unwrap();
        assert_eq!(routine.frequency, Frequency::Once);
        assert_eq!(routine.target_date, None);
        assert_eq!(routine.icon, "activity");
        assert_eq!(routine.escalation.alert_interval, 10);
        assert_eq!(routine.escalation.max_response_window, 45);
        assert!(!routine.escalation.escalation_enabled);
        assert_eq!(routine.scheduled_time(), NaiveTime::from_hms_opt(8, 0, 0));
    }
}
