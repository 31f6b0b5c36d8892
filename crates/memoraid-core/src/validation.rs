//! Form validation run before any network call.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EscalationPolicy, Frequency, Routine};

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());

/// Throwaway mailbox providers rejected at registration.
pub const DISPOSABLE_EMAIL_DOMAINS: &[&str] = &[
    "mailinator.com",
    "yopmail.com",
    "guerrillamail.com",
    "10minutemail.com",
    "tempmail.com",
    "trashmail.com",
    "getairmail.com",
    "sharklasers.com",
    "mailnesia.com",
    "dispostable.com",
];

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Routine name is required.")]
    NameRequired,

    #[error("Invalid time format (HH:MM).")]
    InvalidTime,

    #[error("Cannot schedule a routine in the past. Please select a future time.")]
    TimeInPast,

    #[error("Select at least one day for a weekly routine.")]
    NoWeekdays,

    #[error("A one-time routine needs a target date.")]
    MissingTargetDate,

    #[error("Please use a permanent email address.")]
    DisposableEmail,

    #[error("Password must be at least 8 characters.")]
    PasswordTooShort,

    #[error("Phone number must be exactly 10 digits.")]
    InvalidPhone,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Routine form as filled in by a caregiver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutineDraft {
    pub patient: i64,
    pub name: String,
    /// `HH:MM`, or `HH:MM:SS` when editing a stored routine
    pub time: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    pub icon: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub escalation: EscalationPolicy,
}

impl RoutineDraft {
    /// A blank form with the default daily schedule.
    pub fn new(patient: i64) -> Self {
        Self {
            patient,
            name: String::new(),
            time: "08:00".to_string(),
            frequency: Frequency::Daily,
            days_of_week: (0..7).collect(),
            target_date: None,
            notes: String::new(),
            icon: "activity".to_string(),
            is_active: true,
            escalation: EscalationPolicy::default(),
        }
    }

    /// Pre-fill the edit form from a stored routine.
    pub fn from_routine(routine: &Routine, patient: i64) -> Self {
        Self {
            patient: routine.patient.unwrap_or(patient),
            name: routine.name.clone(),
            time: routine.time.clone(),
            frequency: routine.frequency,
            days_of_week: routine.days_of_week.clone(),
            target_date: routine.target_date,
            notes: routine.notes.clone().unwrap_or_default(),
            icon: routine.icon.clone(),
            is_active: routine.is_active,
            escalation: routine.escalation,
        }
    }

    /// Validate the form against the wall clock.
    ///
    /// Returns the draft with its time normalised to `HH:MM:SS`.
    pub fn validate(mut self, now: NaiveDateTime) -> ValidationResult<Self> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        self.name = self.name.trim().to_string();

        let time = validate_time(&self.time)?;
        if now.date().and_time(time) < now {
            return Err(ValidationError::TimeInPast);
        }
        self.time = time.format("%H:%M:%S").to_string();

        match self.frequency {
            Frequency::Weekly if self.days_of_week.is_empty() => {
                return Err(ValidationError::NoWeekdays)
            }
            Frequency::Once if self.target_date.is_none() => {
                return Err(ValidationError::MissingTargetDate)
            }
            _ => {}
        }

        Ok(self)
    }
}

/// Accept `HH:MM` (or a stored `HH:MM:SS`, truncated to minutes).
pub fn validate_time(value: &str) -> ValidationResult<NaiveTime> {
    let value = value.trim();
    let candidate = if value.len() > 5 { value.get(..5).unwrap_or(value) } else { value };

    let caps = TIME_PATTERN
        .captures(candidate)
        .ok_or(ValidationError::InvalidTime)?;
    let hours: u32 = caps[1].parse().map_err(|_| ValidationError::InvalidTime)?;
    let minutes: u32 = caps[2].parse().map_err(|_| ValidationError::InvalidTime)?;

    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or(ValidationError::InvalidTime)
}

pub fn is_disposable_email(email: &str) -> bool {
    email
        .split_once('@')
        .map(|(_, domain)| domain.to_lowercase())
        .is_some_and(|domain| DISPOSABLE_EMAIL_DOMAINS.contains(&domain.as_str()))
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    if is_disposable_email(email) {
        Err(ValidationError::DisposableEmail)
    } else {
        Ok(())
    }
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(ValidationError::PasswordTooShort)
    }
}

pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if PHONE_PATTERN.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}
