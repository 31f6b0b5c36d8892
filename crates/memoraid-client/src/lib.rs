//! Memoraid Client
//!
//! Async layer over [`memoraid_core`]: talks to the Memoraid REST backend,
//! keeps the patient and caregiver views fresh, and handles pushes and SOS.
//!
//! # Architecture
//!
//! ```text
//!   RefreshScheduler ──tick──┐      push channel ──► NotificationListener
//!     (data, clock)          │                          │ toast, native
//!                            ▼                          │
//!                     Dashboard::refresh ◄──trigger─────┘
//!                            │
//!                            ▼
//!        TaskService ──► CareApi (HttpCareApi / MockCareApi)
//!          │  resolve (memoraid_core::resolver)
//!          │  status writes with create-race fallback
//!          ▼
//!     watch::Sender<View>  ──►  UI
//! ```
//!
//! # Modules
//!
//! - [`config`]: Client configuration (`MEMORAID_*` env, JSON file)
//! - [`telemetry`]: Tracing subscriber setup
//! - [`api`]: REST trait, HTTP client and in-memory backend
//! - [`auth`]: Login, logout, push-token registration
//! - [`tasks`]: Day boards, status changes, routine management
//! - [`alerts`]: Alert listing and acknowledgment
//! - [`scheduler`]: Unified polling loops with cancellation
//! - [`notifications`]: Foreground push listener and toasts
//! - [`sos`]: SOS dispatcher
//! - [`dashboard`]: Patient dashboard and caregiver overview controllers

pub mod alerts;
pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod notifications;
pub mod scheduler;
pub mod sos;
pub mod tasks;
pub mod telemetry;

pub use alerts::{AlertBoard, AlertService};
pub use api::{ApiError, CareApi, HttpCareApi, MockCareApi};
pub use auth::{AuthError, SessionManager, SharedSession};
pub use config::{ClientConfig, ConfigError, ViewKind};
pub use dashboard::{CaregiverOverview, Clock, PatientDashboard, SystemClock, ViewHandle};
pub use notifications::{push_channel, NotificationListener, Notifier, PushMessage, Toast};
pub use scheduler::{RefreshScheduler, RefreshTrigger};
pub use sos::{Geolocator, SosDispatcher, SosOutcome};
pub use tasks::{DayBoard, TaskError, TaskService};
