//! Memoraid Core Library
//!
//! Client-side task-state derivation for the Memoraid care-coordination app.
//!
//! # Architecture
//!
//! ```text
//!   GET routines/?date=      GET logs/?date=
//!          │                       │
//!          └──────────┬────────────┘
//!                     ▼
//!              Schedule Filter        daily / weekly (Mon = 0) / once,
//!                     │               created-after-slot exclusion
//!                     ▼
//!             Routine/Log Merge       no log → pending
//!                     │
//!                     ▼
//!               Time Ordering
//!                     │
//!          ┌──────────┴───────────┐
//!          ▼                      ▼
//!   Next-Task Selector     Caregiver tracker / calendar
//!          │
//!          ▼
//!   Urgency Classifier     normal / upcoming / missed
//! ```
//!
//! # Core Principle
//!
//! **The server owns the truth.** Derived tasks are discarded on every fetch;
//! status changes go through the [`lifecycle`] state machine and are followed
//! by a full re-fetch.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Routine, TaskLog, Alert, User, DailyTask, ...)
//! - [`resolver`]: Task status resolver, next-task selector, urgency classifiers
//! - [`lifecycle`]: Task status state machine
//! - [`validation`]: Form validation
//! - [`db`]: SQLite session store
//! - [`session`]: Explicit session context

pub mod db;
pub mod lifecycle;
pub mod models;
pub mod resolver;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use db::Database;
pub use lifecycle::{transition, TaskAction, TransitionError};
pub use models::{
    Alert, AlertKind, AlertStatus, DailyTask, Frequency, Routine, TaskLog, TaskStatus, User,
};
pub use resolver::{
    classify_overview, classify_urgency, next_task, OverviewUrgency, TaskResolver, Urgency,
};
pub use session::SessionContext;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::DateTime;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MemoraidError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for MemoraidError {
    fn from(e: db::DbError) -> Self {
        MemoraidError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for MemoraidError {
    fn from(e: serde_json::Error) -> Self {
        MemoraidError::SerializationError(e.to_string())
    }
}

impl From<validation::ValidationError> for MemoraidError {
    fn from(e: validation::ValidationError) -> Self {
        MemoraidError::InvalidInput(e.to_string())
    }
}

impl From<chrono::ParseError> for MemoraidError {
    fn from(e: chrono::ParseError) -> Self {
        MemoraidError::InvalidInput(format!("Invalid timestamp: {}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for MemoraidError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MemoraidError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create the session store at the given path.
#[uniffi::export]
pub fn open_session_store(path: String) -> Result<Arc<MemoraidCore>, MemoraidError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(MemoraidCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory session store (for testing).
#[uniffi::export]
pub fn open_session_store_in_memory() -> Result<Arc<MemoraidCore>, MemoraidError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(MemoraidCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Resolve today's board from raw backend JSON.
///
/// `now_rfc3339` is the device wall clock including its UTC offset.
#[uniffi::export]
pub fn resolve_daily_board(
    routines_json: String,
    logs_json: String,
    now_rfc3339: String,
) -> Result<FfiDailyBoard, MemoraidError> {
    let routines: Vec<Routine> = serde_json::from_str(&routines_json)?;
    let logs: Vec<TaskLog> = serde_json::from_str(&logs_json)?;
    let now = DateTime::parse_from_rfc3339(&now_rfc3339)?;

    let tasks = TaskResolver::today(&now).resolve(&routines, &logs);
    let next = next_task(&tasks).cloned();
    let urgency = next
        .as_ref()
        .map(|task| classify_urgency(task, now.naive_local()).as_str().to_string());

    Ok(FfiDailyBoard {
        tasks: tasks.into_iter().map(Into::into).collect(),
        next_task: next.map(Into::into),
        urgency,
    })
}

/// Overview badge label for a stats `next_task_time` value.
#[uniffi::export]
pub fn overview_urgency_label(
    next_task_time: String,
    now_rfc3339: String,
) -> Result<String, MemoraidError> {
    let now = DateTime::parse_from_rfc3339(&now_rfc3339)?;
    Ok(classify_overview(&next_task_time, now.naive_local())
        .label()
        .to_string())
}

/// Check an `HH:MM` routine time; returns it as `HH:MM:SS`.
#[uniffi::export]
pub fn normalize_routine_time(value: String) -> Result<String, MemoraidError> {
    let time = validation::validate_time(&value)?;
    Ok(time.format("%H:%M:%S").to_string())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session store wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MemoraidCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl MemoraidCore {
    /// Current session as stored on this device.
    pub fn session(&self) -> Result<FfiSession, MemoraidError> {
        let db = self.db.lock()?;
        let session = SessionContext::initialize(&db)?;
        Ok(session.into())
    }

    /// Persist a login response (`user_json` is the backend user object).
    pub fn establish_session(
        &self,
        access_token: String,
        refresh_token: String,
        user_json: String,
    ) -> Result<FfiSession, MemoraidError> {
        let db = self.db.lock()?;
        let user: User = serde_json::from_str(&user_json)?;
        let mut session = SessionContext::initialize(&db)?;
        session.establish(&db, access_token, refresh_token, user)?;
        Ok(session.into())
    }

    /// Logout: wipe tokens and cached user.
    pub fn clear_session(&self) -> Result<(), MemoraidError> {
        let db = self.db.lock()?;
        let mut session = SessionContext::initialize(&db)?;
        session.clear(&db)?;
        Ok(())
    }

    /// Device identifier for push registration.
    pub fn device_id(&self) -> Result<String, MemoraidError> {
        let db = self.db.lock()?;
        Ok(db.device_id()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe session snapshot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub authenticated: bool,
    pub access_token: Option<String>,
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

impl From<SessionContext> for FfiSession {
    fn from(session: SessionContext) -> Self {
        let user = session.user();
        Self {
            authenticated: session.is_authenticated(),
            access_token: session.access_token().map(str::to_string),
            user_id: user.map(|u| u.id),
            full_name: user.map(|u| u.full_name.clone()),
            role: user.map(|u| format!("{:?}", u.role).to_lowercase()),
        }
    }
}

/// FFI-safe daily task.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailyTask {
    pub routine_id: i64,
    pub log_id: Option<i64>,
    pub name: String,
    pub time: String,
    pub icon: String,
    pub status: String,
    pub historical: bool,
}

impl From<DailyTask> for FfiDailyTask {
    fn from(task: DailyTask) -> Self {
        Self {
            routine_id: task.routine_id,
            log_id: task.log_id,
            historical: task.is_historical(),
            status: task.status.as_str().to_string(),
            name: task.name,
            time: task.time,
            icon: task.icon,
        }
    }
}

/// FFI-safe resolved board.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailyBoard {
    pub tasks: Vec<FfiDailyTask>,
    pub next_task: Option<FfiDailyTask>,
    pub urgency: Option<String>,
}
