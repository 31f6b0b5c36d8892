//! SOS dispatch: single submission, failure recovery, best-effort location.

use std::sync::Arc;
use std::time::Duration;

use memoraid_client::api::{ApiCall, MockCareApi};
use memoraid_client::config::ClientConfig;
use memoraid_client::sos::{
    Coordinates, Geolocator, LocationError, NoGeolocation, SosDispatcher, SosOutcome,
    SOS_FAILURE_MESSAGE, SOS_MESSAGE,
};
use memoraid_core::models::AlertKind;

struct FixedLocator;

impl Geolocator for FixedLocator {
    async fn locate(&self, _high_accuracy: bool) -> Result<Coordinates, LocationError> {
        Ok(Coordinates {
            latitude: 12.97,
            longitude: 77.59,
        })
    }
}

/// A location provider that never answers.
struct HangingLocator;

impl Geolocator for HangingLocator {
    async fn locate(&self, _high_accuracy: bool) -> Result<Coordinates, LocationError> {
        std::future::pending().await
    }
}

fn dispatcher<G: Geolocator>(api: &Arc<MockCareApi>, locator: G) -> SosDispatcher<MockCareApi, G> {
    SosDispatcher::new(Arc::clone(api), Arc::new(locator), &ClientConfig::default())
}

fn sent_alerts(api: &MockCareApi) -> usize {
    api.count_calls(|c| matches!(c, ApiCall::CreateAlert(_)))
}

#[tokio::test(start_paused = true)]
async fn test_rapid_presses_send_one_alert() {
    let api = Arc::new(MockCareApi::new());
    api.alert_latency(Duration::from_secs(2));
    let sos = dispatcher(&api, FixedLocator);

    let (first, second) = tokio::join!(sos.trigger(), sos.trigger());
    assert_eq!(first, SosOutcome::Sent { located: true });
    assert_eq!(second, SosOutcome::Ignored);

    // Still inside the confirmation window
    assert_eq!(sos.trigger().await, SosOutcome::Ignored);
    assert_eq!(sent_alerts(&api), 1);

    let alert = &api.alerts()[0];
    assert_eq!(alert.kind, AlertKind::Sos);
    assert_eq!(alert.message.as_deref(), Some(SOS_MESSAGE));
    assert_eq!(alert.latitude, Some(12.97));
}

#[tokio::test(start_paused = true)]
async fn test_sent_window_resets_state() {
    let api = Arc::new(MockCareApi::new());
    let sos = dispatcher(&api, NoGeolocation);
    let state = sos.state();

    assert_eq!(sos.trigger().await, SosOutcome::Sent { located: false });
    assert!(state.borrow().sent);
    assert!(!state.borrow().sending);

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(*state.borrow(), Default::default());

    assert_eq!(sos.trigger().await, SosOutcome::Sent { located: false });
    assert_eq!(sent_alerts(&api), 2);
}

#[tokio::test]
async fn test_failure_shows_message_and_allows_retry() {
    let api = Arc::new(MockCareApi::new());
    api.fail_alerts(true);
    let sos = dispatcher(&api, NoGeolocation);
    let state = sos.state();

    assert!(matches!(sos.trigger().await, SosOutcome::Failed(_)));
    assert_eq!(state.borrow().error.as_deref(), Some(SOS_FAILURE_MESSAGE));
    assert!(!state.borrow().sending);
    assert!(!state.borrow().sent);

    sos.dismiss_error();
    assert!(state.borrow().error.is_none());

    // The guard is released right away after a failure.
    api.fail_alerts(false);
    assert_eq!(sos.trigger().await, SosOutcome::Sent { located: false });
    assert_eq!(sent_alerts(&api), 2);
}

#[tokio::test(start_paused = true)]
async fn test_location_timeout_sends_without_coordinates() {
    let api = Arc::new(MockCareApi::new());
    let sos = dispatcher(&api, HangingLocator);

    let started = tokio::time::Instant::now();
    assert_eq!(sos.trigger().await, SosOutcome::Sent { located: false });
    assert!(started.elapsed() >= Duration::from_secs(10));

    let alert = &api.alerts()[0];
    assert_eq!(alert.latitude, None);
    assert_eq!(alert.longitude, None);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_press_releases_guard() {
    let api = Arc::new(MockCareApi::new());
    api.alert_latency(Duration::from_secs(5));
    let sos = dispatcher(&api, NoGeolocation);
    let state = sos.state();

    // The caller gives up while the alert request is still pending.
    let abandoned = tokio::time::timeout(Duration::from_secs(1), sos.trigger()).await;
    assert!(abandoned.is_err());
    assert_eq!(*state.borrow(), Default::default());

    assert_eq!(sos.trigger().await, SosOutcome::Sent { located: false });
    assert!(state.borrow().sent);
    assert_eq!(sent_alerts(&api), 2);
}
