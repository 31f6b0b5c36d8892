//! Explicit session context.
//!
//! Lifecycle: `initialize` from the store on load, `establish` after login,
//! `clear` on logout. Components that call the API receive the context
//! instead of reading global storage.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{Role, User};

/// Auth tokens and cached user for the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<User>,
    /// Set when a login completed; tokens alone are not enough
    authenticated: bool,
}

impl SessionContext {
    pub(crate) fn restore(
        access_token: Option<String>,
        refresh_token: Option<String>,
        user: Option<User>,
        authenticated: bool,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
            authenticated,
        }
    }

    /// Load the persisted session.
    pub fn initialize(db: &Database) -> DbResult<Self> {
        db.load_session()
    }

    /// Record a successful login and persist it.
    pub fn establish(
        &mut self,
        db: &Database,
        access_token: String,
        refresh_token: String,
        user: User,
    ) -> DbResult<()> {
        self.access_token = Some(access_token).filter(|t| !t.is_empty());
        self.refresh_token = Some(refresh_token).filter(|t| !t.is_empty());
        self.user = Some(user);
        self.authenticated = self.access_token.is_some();
        db.save_session(self)
    }

    /// Replace the cached user (after a profile or onboarding update).
    pub fn update_user(&mut self, db: &Database, user: User) -> DbResult<()> {
        self.user = Some(user);
        db.save_session(self)
    }

    /// Forget everything, in memory and on disk.
    pub fn clear(&mut self, db: &Database) -> DbResult<()> {
        *self = Self::default();
        db.clear_session()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub(crate) fn authenticated_flag(&self) -> bool {
        self.authenticated
    }

    /// Requires both an access token and a completed login.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.authenticated
    }
}
