//! View controllers for the patient dashboard and the caregiver overview.
//!
//! Controllers publish their view state on `watch` channels; a UI renders
//! whatever the receiver holds.

mod caregiver;
mod patient;

pub use caregiver::*;
pub use patient::*;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::notifications::Toast;
use crate::scheduler::RefreshScheduler;

/// Wall clock with the device's UTC offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock pinned to one instant, movable by hand.
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A running view: its polling loops and notification listener.
///
/// Dropping the handle tears everything down.
pub struct ViewHandle {
    scheduler: RefreshScheduler,
    listener: Option<JoinHandle<()>>,
    toasts: watch::Receiver<Option<Toast>>,
}

impl ViewHandle {
    pub(crate) fn new(
        scheduler: RefreshScheduler,
        listener: Option<JoinHandle<()>>,
        toasts: watch::Receiver<Option<Toast>>,
    ) -> Self {
        Self {
            scheduler,
            listener,
            toasts,
        }
    }

    pub fn toasts(&self) -> watch::Receiver<Option<Toast>> {
        self.toasts.clone()
    }

    pub fn active_loops(&self) -> usize {
        self.scheduler.active()
    }

    pub fn stop(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.scheduler.cancel();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub(crate) fn shared<T>(value: T) -> Arc<watch::Sender<T>> {
    let (tx, _) = watch::channel(value);
    Arc::new(tx)
}
