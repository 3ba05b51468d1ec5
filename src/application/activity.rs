//! Activity Session - the interactive "where am I" display
//!
//! Drives the full-screen surface through its lifecycle:
//! appearance starts a resolution, disappearance cancels it and asks the
//! host to refresh complications.

use crate::application::pipeline::LocationPipeline;
use crate::domain::error::ResolveError;
use crate::domain::ports::{ComplicationHost, PermissionGate, TextView};
use crate::domain::services::DescriptionFormatter;
use crate::domain::value_objects::LocationRequest;
use crate::infrastructure::{MainThread, Subscriptions};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lifecycle state of the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    Idle,
    Resolving,
    Shown,
    Failed,
}

/// State touched from both the worker and the main thread.
struct Shared {
    state: Mutex<ActivityState>,
    /// Bumped on every appearance and disappearance; results carrying an
    /// older generation are discarded.
    generation: AtomicU64,
}

/// Interactive location display.
pub struct ActivitySession {
    pipeline: Arc<LocationPipeline>,
    permissions: Arc<dyn PermissionGate>,
    host: Arc<dyn ComplicationHost>,
    view: Arc<dyn TextView>,
    main: MainThread,
    formatter: DescriptionFormatter,
    request: LocationRequest,
    shared: Arc<Shared>,
    subscriptions: Mutex<Subscriptions>,
}

impl ActivitySession {
    pub fn new(
        pipeline: Arc<LocationPipeline>,
        permissions: Arc<dyn PermissionGate>,
        host: Arc<dyn ComplicationHost>,
        view: Arc<dyn TextView>,
        main: MainThread,
        formatter: DescriptionFormatter,
    ) -> Self {
        Self {
            pipeline,
            permissions,
            host,
            view,
            main,
            formatter,
            request: LocationRequest::activity(),
            shared: Arc::new(Shared {
                state: Mutex::new(ActivityState::Idle),
                generation: AtomicU64::new(0),
            }),
            subscriptions: Mutex::new(Subscriptions::new()),
        }
    }

    /// Override the location request (the default is continuous high accuracy).
    pub fn with_request(mut self, request: LocationRequest) -> Self {
        self.request = request;
        self
    }

    pub fn state(&self) -> ActivityState {
        *self.shared.state.lock()
    }

    /// The surface became visible: request permission and resolve.
    ///
    /// Does nothing while a resolution is already running.
    pub fn on_start(&self) {
        {
            let mut state = self.shared.state.lock();
            if *state == ActivityState::Resolving {
                tracing::debug!("activity already resolving");
                return;
            }
            *state = ActivityState::Resolving;
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let subscriptions = {
            let mut guard = self.subscriptions.lock();
            if guard.is_disposed() {
                *guard = Subscriptions::new();
            }
            guard.clone()
        };

        let pipeline = self.pipeline.clone();
        let permissions = self.permissions.clone();
        let view = self.view.clone();
        let main = self.main.clone();
        let formatter = self.formatter.clone();
        let request = self.request.clone();
        let shared = self.shared.clone();

        let started = subscriptions.spawn(async move {
            let result = if permissions.request_location_permission().await {
                pipeline.resolve_granted(&request).await
            } else {
                Err(ResolveError::PermissionDenied)
            };

            let (text, next) = match result {
                Ok(resolved) => (
                    formatter.activity_text(&resolved.location, &resolved.address, Utc::now()),
                    ActivityState::Shown,
                ),
                Err(e) => {
                    tracing::warn!("activity location resolution failed: {}", e);
                    (formatter.location_error(), ActivityState::Failed)
                }
            };

            main.post(move || {
                if shared.generation.load(Ordering::SeqCst) != generation {
                    tracing::debug!("discarding result of torn down activity");
                    return;
                }
                *shared.state.lock() = next;
                view.set_text(&text);
            });
        });

        if started.is_none() {
            *self.shared.state.lock() = ActivityState::Idle;
        }
    }

    /// The surface went away: cancel the run, then refresh complications
    /// if location access is granted.
    pub async fn on_stop(&self) {
        self.subscriptions.lock().dispose();

        // Serialised with pending UI updates so none lands after this.
        let shared = self.shared.clone();
        self.main
            .run(move || {
                shared.generation.fetch_add(1, Ordering::SeqCst);
                *shared.state.lock() = ActivityState::Idle;
            })
            .await;

        if self.permissions.has_location_permission() {
            tracing::info!("activity stopped, forcing complication update");
            self.host.request_update_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::*;
    use std::time::Duration;

    struct Fixture {
        session: ActivitySession,
        view: Arc<RecordingTextView>,
        host: Arc<MockHost>,
        source: Arc<MockLocationSource>,
        permissions: Arc<MockPermissionGate>,
        main: MainThread,
    }

    fn fixture(
        permissions: MockPermissionGate,
        source: MockLocationSource,
        geocoder: MockGeocoder,
    ) -> Fixture {
        let permissions = Arc::new(permissions);
        let source = Arc::new(source);
        let pipeline = Arc::new(LocationPipeline::new(
            permissions.clone(),
            source.clone(),
            Arc::new(geocoder),
        ));
        let view = Arc::new(RecordingTextView::default());
        let host = Arc::new(MockHost::default());
        let main = MainThread::start().unwrap();

        let session = ActivitySession::new(
            pipeline,
            permissions.clone(),
            host.clone(),
            view.clone(),
            main.clone(),
            DescriptionFormatter::default(),
        );

        Fixture {
            session,
            view,
            host,
            source,
            permissions,
            main,
        }
    }

    async fn settle(main: &MainThread) {
        tokio::time::sleep(Duration::from_millis(30)).await;
        main.flush().await;
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::silent(),
            MockGeocoder::found(main_street()),
        );
        assert_eq!(f.session.state(), ActivityState::Idle);
    }

    #[tokio::test]
    async fn test_shows_address_on_success() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::with_last(fix_minutes_ago(5)),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        settle(&f.main).await;

        assert_eq!(f.session.state(), ActivityState::Shown);
        assert_eq!(f.view.texts(), vec!["You were at 100 Main St 5 minutes ago".to_string()]);
    }

    #[tokio::test]
    async fn test_permission_denied_shows_error() {
        let permissions = MockPermissionGate::denied();
        let f = fixture(
            permissions,
            MockLocationSource::with_last(fix_minutes_ago(1)),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        settle(&f.main).await;

        assert_eq!(f.session.state(), ActivityState::Failed);
        assert_eq!(f.view.texts(), vec!["Location error".to_string()]);
        assert_eq!(f.source.subscriptions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_geocode_failure_shows_error() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::with_last(fix_minutes_ago(1)),
            MockGeocoder::failing("offline"),
        );

        f.session.on_start();
        settle(&f.main).await;

        assert_eq!(f.session.state(), ActivityState::Failed);
        assert_eq!(f.view.texts(), vec!["Location error".to_string()]);
    }

    #[tokio::test]
    async fn test_stop_mid_resolution_cancels_and_suppresses_update() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::silent(),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(f.session.state(), ActivityState::Resolving);
        assert_eq!(f.source.active_subscriptions(), 1);

        f.session.on_stop().await;
        settle(&f.main).await;

        assert_eq!(f.session.state(), ActivityState::Idle);
        assert!(f.view.texts().is_empty());
        assert_eq!(f.source.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_stop_discards_late_result() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::with_last(fix_minutes_ago(1)),
            MockGeocoder::found(main_street()).with_delay(Duration::from_millis(50)),
        );

        f.session.on_start();
        f.session.on_stop().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        f.main.flush().await;

        assert!(f.view.texts().is_empty());
        assert_eq!(f.session.state(), ActivityState::Idle);
    }

    #[tokio::test]
    async fn test_stop_forces_complication_update_when_granted() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::with_last(fix_minutes_ago(1)),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        settle(&f.main).await;
        f.session.on_stop().await;

        assert_eq!(f.host.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_without_permission_does_not_refresh() {
        let f = fixture(
            MockPermissionGate::denied(),
            MockLocationSource::silent(),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        settle(&f.main).await;
        f.session.on_stop().await;

        assert_eq!(f.host.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_permission_revoked_while_shown_skips_refresh() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::with_last(fix_minutes_ago(1)),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        settle(&f.main).await;
        assert_eq!(f.session.state(), ActivityState::Shown);

        f.permissions.set_granted(false);
        f.session.on_stop().await;

        assert_eq!(f.session.state(), ActivityState::Idle);
        assert_eq!(f.host.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_restart_after_stop_resolves_again() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::with_last(fix_minutes_ago(2)),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        settle(&f.main).await;
        f.session.on_stop().await;
        f.session.on_start();
        settle(&f.main).await;

        assert_eq!(f.session.state(), ActivityState::Shown);
        assert_eq!(f.view.texts().len(), 2);
    }

    #[tokio::test]
    async fn test_start_while_resolving_is_ignored() {
        let f = fixture(
            MockPermissionGate::granted(),
            MockLocationSource::silent(),
            MockGeocoder::found(main_street()),
        );

        f.session.on_start();
        f.session.on_start();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(f.source.subscriptions.load(Ordering::SeqCst), 1);
        f.session.on_stop().await;
    }
}
