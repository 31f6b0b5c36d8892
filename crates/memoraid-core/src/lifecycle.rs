//! Task completion / escalation state machine.
//!
//! ```text
//!            Complete                 Escalate
//!  pending ───────────► completed    missed ───────► escalated
//!     │  ▲                  │           ▲
//!     │  └──── Reopen ──────┘           │
//!     └────────── MarkMissed ───────────┘
//! ```
//!
//! `escalated` is terminal. `completed` only leaves through an explicit
//! caregiver `Reopen`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TaskStatus;

/// A status-changing action on a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskAction {
    /// Patient or caregiver marks the task done
    Complete,
    /// Caregiver acknowledges a missed (or overdue, un-logged) task
    Escalate,
    /// Caregiver undoes a completion
    Reopen,
    /// Response window elapsed (raised by the backend scheduler)
    MarkMissed,
}

impl TaskAction {
    /// Status the task ends in after the action.
    pub fn target(&self) -> TaskStatus {
        match self {
            TaskAction::Complete => TaskStatus::Completed,
            TaskAction::Escalate => TaskStatus::Escalated,
            TaskAction::Reopen => TaskStatus::Pending,
            TaskAction::MarkMissed => TaskStatus::Missed,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action:?} a task that is {from:?}")]
    NotAllowed { from: TaskStatus, action: TaskAction },
}

/// Validate an action against the current status and return the new status.
pub fn transition(from: TaskStatus, action: TaskAction) -> Result<TaskStatus, TransitionError> {
    use TaskAction::*;
    use TaskStatus::*;

    let allowed = matches!(
        (from, action),
        (Pending, Complete)
            | (Missed, Complete)
            | (Missed, Escalate)
            | (Pending, Escalate)
            | (Completed, Reopen)
            | (Pending, MarkMissed)
    );

    if allowed {
        Ok(action.target())
    } else {
        Err(TransitionError::NotAllowed { from, action })
    }
}
