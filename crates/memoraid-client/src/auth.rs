//! Login, logout and push registration around the session store.

use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use memoraid_core::db::DbError;
use memoraid_core::models::User;
use memoraid_core::{Database, SessionContext};

use crate::api::{ApiError, CareApi};

/// Session shared between the HTTP client and the services.
pub type SharedSession = Arc<RwLock<SessionContext>>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session store error: {0}")]
    Store(#[from] DbError),

    #[error("Session lock poisoned")]
    LockPoisoned,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Owns the on-device session store and the in-memory session.
#[derive(Clone)]
pub struct SessionManager {
    db: Arc<Mutex<Database>>,
    session: SharedSession,
}

impl SessionManager {
    /// Open the store at `path` and load whatever session it holds.
    pub fn open(path: impl AsRef<Path>) -> AuthResult<Self> {
        Self::with_database(Database::open(path)?)
    }

    pub fn in_memory() -> AuthResult<Self> {
        Self::with_database(Database::open_in_memory()?)
    }

    fn with_database(db: Database) -> AuthResult<Self> {
        let session = SessionContext::initialize(&db)?;
        tracing::info!(
            authenticated = session.is_authenticated(),
            "Session store loaded"
        );
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            session: Arc::new(RwLock::new(session)),
        })
    }

    pub fn shared(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> AuthResult<SessionContext> {
        Ok(self
            .session
            .read()
            .map_err(|_| AuthError::LockPoisoned)?
            .clone())
    }

    pub fn current_user(&self) -> AuthResult<Option<User>> {
        Ok(self.snapshot()?.user().cloned())
    }

    /// Log in and persist the returned tokens and user.
    pub async fn login<A: CareApi>(&self, api: &A, email: &str, password: &str) -> AuthResult<User> {
        let response = api.login(email.trim(), password).await?;
        let user = response.user.clone();

        {
            let db = self.db.lock().map_err(|_| AuthError::LockPoisoned)?;
            let mut session = self.session.write().map_err(|_| AuthError::LockPoisoned)?;
            session.establish(&db, response.access, response.refresh, response.user)?;
        }

        tracing::info!(user_id = user.id, role = ?user.role, "Logged in");
        Ok(user)
    }

    /// Store an updated profile (after onboarding or a settings change).
    pub fn update_user(&self, user: User) -> AuthResult<()> {
        let db = self.db.lock().map_err(|_| AuthError::LockPoisoned)?;
        let mut session = self.session.write().map_err(|_| AuthError::LockPoisoned)?;
        session.update_user(&db, user)?;
        Ok(())
    }

    /// Wipe tokens and the cached user, in memory and on disk.
    pub fn logout(&self) -> AuthResult<()> {
        let db = self.db.lock().map_err(|_| AuthError::LockPoisoned)?;
        let mut session = self.session.write().map_err(|_| AuthError::LockPoisoned)?;
        session.clear(&db)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Register this device's push token with the backend.
    ///
    /// Best effort: failures are logged and reported as `false`.
    pub async fn register_push_token<A: CareApi>(&self, api: &A, token: &str) -> bool {
        let device_id = match self.device_id() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "No device id, skipping push registration");
                return false;
            }
        };

        match api.register_push_token(token, &device_id).await {
            Ok(()) => {
                if let Err(e) = self.remember_push_token(token) {
                    tracing::warn!(error = %e, "Could not store push token");
                }
                tracing::info!("Push notifications registered");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register push token");
                false
            }
        }
    }

    pub fn device_id(&self) -> AuthResult<String> {
        let db = self.db.lock().map_err(|_| AuthError::LockPoisoned)?;
        Ok(db.device_id()?)
    }

    fn remember_push_token(&self, token: &str) -> AuthResult<()> {
        let db = self.db.lock().map_err(|_| AuthError::LockPoisoned)?;
        db.set_push_token(token)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, MockCareApi};
    use memoraid_core::models::{AccountStatus, Role};

    fn patient() -> User {
        User {
            id: 11,
            full_name: "Lakshmi Nair".into(),
            email: "lakshmi@example.com".into(),
            role: Role::Patient,
            status: AccountStatus::Active,
            caregiver_profile: None,
            patient_profile: None,
        }
    }

    #[tokio::test]
    async fn test_login_establishes_shared_session() {
        let manager = SessionManager::in_memory().unwrap();
        let api = MockCareApi::new().with_user(patient());

        let user = manager.login(&api, " lakshmi@example.com ", "secret").await.unwrap();
        assert_eq!(user.id, 11);

        let shared = manager.shared();
        let session = shared.read().unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token(), Some("access-11"));
        assert_eq!(api.calls(), vec![ApiCall::Login("lakshmi@example.com".into())]);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_empty() {
        let manager = SessionManager::in_memory().unwrap();
        let api = MockCareApi::new();

        let err = manager.login(&api, "x@example.com", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Api(ApiError::Unauthorized)));
        assert!(!manager.snapshot().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let manager = SessionManager::in_memory().unwrap();
        let api = MockCareApi::new().with_user(patient());
        manager.login(&api, "lakshmi@example.com", "secret").await.unwrap();

        manager.logout().unwrap();
        assert!(manager.current_user().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_push_registration_uses_stable_device_id() {
        let manager = SessionManager::in_memory().unwrap();
        let api = MockCareApi::new();

        assert!(manager.register_push_token(&api, "fcm-1").await);
        let device_id = manager.device_id().unwrap();
        assert_eq!(
            api.calls(),
            vec![ApiCall::RegisterPushToken {
                token: "fcm-1".into(),
                device_id,
            }]
        );
    }
}
