//! Session and device database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::User;
use crate::session::SessionContext;

impl Database {
    /// Persist the session (replaces the single stored row).
    pub fn save_session(&self, session: &SessionContext) -> DbResult<()> {
        let user_json = session
            .user()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            r#"
            INSERT INTO session (id, access_token, refresh_token, user_json, authenticated, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                user_json = excluded.user_json,
                authenticated = excluded.authenticated,
                updated_at = excluded.updated_at
            "#,
            params![
                session.access_token(),
                session.refresh_token(),
                user_json,
                session.authenticated_flag(),
            ],
        )?;
        Ok(())
    }

    /// Load the stored session, or an empty one if none was saved.
    ///
    /// A corrupt cached user is dropped rather than failing the load.
    pub fn load_session(&self) -> DbResult<SessionContext> {
        let row = self
            .conn
            .query_row(
                "SELECT access_token, refresh_token, user_json, authenticated FROM session WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((access, refresh, user_json, authenticated)) = row else {
            return Ok(SessionContext::default());
        };

        let user = user_json.and_then(|json| serde_json::from_str::<User>(&json).ok());
        Ok(SessionContext::restore(access, refresh, user, authenticated))
    }

    /// Remove tokens and cached user.
    pub fn clear_session(&self) -> DbResult<()> {
        self.conn.execute("DELETE FROM session", [])?;
        Ok(())
    }

    /// Stable device identifier, generated on first use.
    pub fn device_id(&self) -> DbResult<String> {
        let existing: Option<String> = self
            .conn
            .query_row("SELECT device_id FROM device WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO device (id, device_id) VALUES (1, ?1)",
            params![id],
        )?;
        Ok(id)
    }

    /// Remember the last push token registered with the backend.
    pub fn set_push_token(&self, token: &str) -> DbResult<()> {
        self.device_id()?;
        self.conn.execute(
            "UPDATE device SET push_token = ?1 WHERE id = 1",
            params![token],
        )?;
        Ok(())
    }

    pub fn push_token(&self) -> DbResult<Option<String>> {
        let token = self
            .conn
            .query_row("SELECT push_token FROM device WHERE id = 1", [], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(token.flatten())
    }
}
