//! SOS dispatcher.
//!
//! One alert per press: a re-entrancy guard drops presses while a send is
//! in flight or while the "sent" confirmation is showing. Location is best
//! effort and never blocks the alert.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use memoraid_core::models::NewAlert;

use crate::api::{ApiError, CareApi};
use crate::config::ClientConfig;

pub const SOS_MESSAGE: &str = "Patient triggered SOS from dashboard";
pub const SOS_FAILURE_MESSAGE: &str =
    "Could not send the SOS alert. Please call your caregiver directly.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable")]
    Unavailable,

    #[error("Geolocation not supported on this device")]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Device location provider.
pub trait Geolocator: Send + Sync {
    fn locate(
        &self,
        high_accuracy: bool,
    ) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// Device without a location provider.
#[derive(Debug, Default)]
pub struct NoGeolocation;

impl Geolocator for NoGeolocation {
    async fn locate(&self, _high_accuracy: bool) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// What the SOS button shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SosState {
    pub sending: bool,
    pub sent: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SosOutcome {
    Sent { located: bool },
    /// A send is already in flight or was just confirmed
    Ignored,
    Failed(ApiError),
}

pub struct SosDispatcher<A, G> {
    api: Arc<A>,
    locator: Arc<G>,
    in_flight: Arc<AtomicBool>,
    state: Arc<watch::Sender<SosState>>,
    location_timeout: Duration,
    sent_window: Duration,
}

impl<A: CareApi, G: Geolocator> SosDispatcher<A, G> {
    pub fn new(api: Arc<A>, locator: Arc<G>, config: &ClientConfig) -> Self {
        let (state, _) = watch::channel(SosState::default());
        Self {
            api,
            locator,
            in_flight: Arc::new(AtomicBool::new(false)),
            state: Arc::new(state),
            location_timeout: config.sos_location_timeout(),
            sent_window: config.sos_sent_window(),
        }
    }

    pub fn state(&self) -> watch::Receiver<SosState> {
        self.state.subscribe()
    }

    /// Close the failure message.
    pub fn dismiss_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    pub async fn trigger(&self) -> SosOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("SOS already in progress, ignoring press");
            return SosOutcome::Ignored;
        }
        let press = PressGuard {
            in_flight: Arc::clone(&self.in_flight),
            state: Arc::clone(&self.state),
            armed: true,
        };

        self.state.send_replace(SosState {
            sending: true,
            ..SosState::default()
        });

        let location = self.locate().await;
        let alert = NewAlert::sos(
            SOS_MESSAGE,
            location.map(|c| (c.latitude, c.longitude)),
        );

        match self.api.create_alert(&alert).await {
            Ok(created) => {
                tracing::info!(alert = created.id, located = location.is_some(), "SOS alert sent");
                press.defuse();
                self.state.send_replace(SosState {
                    sending: false,
                    sent: true,
                    error: None,
                });
                self.reset_after_window();
                SosOutcome::Sent {
                    located: location.is_some(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "SOS alert failed");
                drop(press);
                self.state.send_replace(SosState {
                    sending: false,
                    sent: false,
                    error: Some(SOS_FAILURE_MESSAGE.to_string()),
                });
                SosOutcome::Failed(e)
            }
        }
    }

    async fn locate(&self) -> Option<Coordinates> {
        match tokio::time::timeout(self.location_timeout, self.locator.locate(true)).await {
            Ok(Ok(coords)) => Some(coords),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Sending SOS without location");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.location_timeout.as_secs(),
                    "Location timed out, sending SOS without it"
                );
                None
            }
        }
    }

    fn reset_after_window(&self) {
        let in_flight = Arc::clone(&self.in_flight);
        let state = Arc::clone(&self.state);
        let window = self.sent_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            state.send_replace(SosState::default());
            in_flight.store(false, Ordering::SeqCst);
        });
    }
}

/// Releases the press guard if a send ends without success, including when
/// the `trigger` future is dropped mid-flight.
struct PressGuard {
    in_flight: Arc<AtomicBool>,
    state: Arc<watch::Sender<SosState>>,
    armed: bool,
}

impl PressGuard {
    /// Keep the guard up; the sent-window timer releases it.
    fn defuse(mut self) {
        self.armed = false;
    }
}

impl Drop for PressGuard {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_replace(SosState::default());
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }
}
