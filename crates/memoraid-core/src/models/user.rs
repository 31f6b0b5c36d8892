//! User and profile models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Caregiver,
    Patient,
}

/// Account approval state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Pending,
    Active,
    Disabled,
}

/// Caregiver permission tier. Only primary caregivers edit routines and profiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CareLevel {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaregiverProfile {
    #[serde(default)]
    pub relationship: Option<String>,
    pub level: CareLevel,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub familiar_name: Option<String>,
    #[serde(default)]
    pub primary_caregiver_email: Option<String>,
}

/// An authenticated Memoraid user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub caregiver_profile: Option<CaregiverProfile>,
    #[serde(default)]
    pub patient_profile: Option<PatientProfile>,
}

impl User {
    pub fn is_primary_caregiver(&self) -> bool {
        self.role == Role::Caregiver
            && self
                .caregiver_profile
                .as_ref()
                .is_some_and(|p| p.level == CareLevel::Primary)
    }

    /// Users without a role profile still have onboarding to finish.
    pub fn needs_onboarding(&self) -> bool {
        match self.role {
            Role::Admin => false,
            Role::Caregiver => self.caregiver_profile.is_none(),
            Role::Patient => self.patient_profile.is_none(),
        }
    }

    /// Name shown to the patient: the familiar name when set.
    pub fn display_name(&self) -> &str {
        self.patient_profile
            .as_ref()
            .and_then(|p| p.familiar_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caregiver(level: Option<CareLevel>) -> User {
        User {
            id: 1,
            full_name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            role: Role::Caregiver,
            status: AccountStatus::Active,
            caregiver_profile: level.map(|level| CaregiverProfile {
                relationship: Some("child".into()),
                level,
                phone_number: None,
                city: None,
            }),
            patient_profile: None,
        }
    }

    #[test]
    fn test_primary_caregiver() {
        assert!(caregiver(Some(CareLevel::Primary)).is_primary_caregiver());
        assert!(!caregiver(Some(CareLevel::Secondary)).is_primary_caregiver());
        assert!(!caregiver(None).is_primary_caregiver());
    }

    #[test]
    fn test_needs_onboarding() {
        assert!(caregiver(None).needs_onboarding());
        assert!(!caregiver(Some(CareLevel::Secondary)).needs_onboarding());
    }
}
