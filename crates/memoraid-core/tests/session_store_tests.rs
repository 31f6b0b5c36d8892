//! Session store persistence across reopen of the on-disk database.

use memoraid_core::models::{AccountStatus, CareLevel, CaregiverProfile, Role, User};
use memoraid_core::{Database, SessionContext};
use tempfile::TempDir;

fn caregiver() -> User {
    User {
        id: 7,
        full_name: "Arun Menon".into(),
        email: "arun@example.com".into(),
        role: Role::Caregiver,
        status: AccountStatus::Active,
        caregiver_profile: Some(CaregiverProfile {
            relationship: Some("Son".into()),
            level: CareLevel::Primary,
            phone_number: Some("9876543210".into()),
            city: None,
        }),
        patient_profile: None,
    }
}

#[test]
fn test_session_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");

    {
        let db = Database::open(&path).unwrap();
        let mut session = SessionContext::initialize(&db).unwrap();
        session
            .establish(&db, "access-1".into(), "refresh-1".into(), caregiver())
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let session = SessionContext::initialize(&db).unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.access_token(), Some("access-1"));
    assert_eq!(session.refresh_token(), Some("refresh-1"));
    assert!(session.user().unwrap().is_primary_caregiver());
}

#[test]
fn test_logout_persists_and_keeps_device() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");

    let device = {
        let db = Database::open(&path).unwrap();
        let mut session = SessionContext::default();
        session
            .establish(&db, "access".into(), "refresh".into(), caregiver())
            .unwrap();
        let device = db.device_id().unwrap();
        session.clear(&db).unwrap();
        device
    };

    let db = Database::open(&path).unwrap();
    let session = SessionContext::initialize(&db).unwrap();
    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
    assert_eq!(db.device_id().unwrap(), device);
}

#[test]
fn test_corrupt_cached_user_is_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");

    let db = Database::open(&path).unwrap();
    db.conn()
        .execute(
            "INSERT INTO session (id, access_token, refresh_token, user_json, authenticated, updated_at)
             VALUES (1, 'tok', NULL, '{not json', 1, datetime('now'))",
            [],
        )
        .unwrap();

    let session = SessionContext::initialize(&db).unwrap();
    assert!(session.is_authenticated());
    assert!(session.user().is_none());
}
