//! Complication Provider - answers watch face data requests
//!
//! Every request the host makes carries a [`ResponseHandle`]. The host holds
//! a wake lock until the handle is answered, so the provider answers every
//! request exactly once, with rendered fallback text when resolution fails.

use crate::application::pipeline::LocationPipeline;
use crate::domain::services::{ComplicationData, ComplicationRenderer};
use crate::domain::value_objects::{ComplicationKind, LocationRequest};
use crate::infrastructure::{MainThread, Subscriptions};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

/// A data request from the complication host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplicationRequest {
    pub kind: ComplicationKind,
    /// Opaque token identifying the request to the host
    pub token: Uuid,
}

impl ComplicationRequest {
    pub fn new(kind: ComplicationKind) -> Self {
        Self {
            kind,
            token: Uuid::new_v4(),
        }
    }
}

/// Single-use reply channel for one complication request.
///
/// `respond` consumes the handle, so a request cannot be answered twice.
/// Dropping an unanswered handle closes the channel, which the host sees
/// as the request being abandoned.
pub struct ResponseHandle {
    token: Uuid,
    tx: Option<oneshot::Sender<Option<ComplicationData>>>,
}

impl ResponseHandle {
    /// Create a handle for `token` and the receiver the host waits on.
    pub fn new(token: Uuid) -> (Self, oneshot::Receiver<Option<ComplicationData>>) {
        let (tx, rx) = oneshot::channel();
        (Self { token, tx: Some(tx) }, rx)
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    /// Answer with a payload, or `None` for "no data".
    pub fn respond(mut self, data: Option<ComplicationData>) {
        if let Some(tx) = self.tx.take() {
            if tx.send(data).is_err() {
                tracing::debug!("host stopped waiting for complication {}", self.token);
            }
        }
    }
}

impl Drop for ResponseHandle {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::warn!("complication request {} dropped without a response", self.token);
        }
    }
}

/// Background provider of the short-text and long-text complications.
pub struct ComplicationProvider {
    pipeline: Arc<LocationPipeline>,
    renderer: ComplicationRenderer,
    main: MainThread,
    request: LocationRequest,
    subscriptions: Subscriptions,
}

impl ComplicationProvider {
    pub fn new(pipeline: Arc<LocationPipeline>, renderer: ComplicationRenderer, main: MainThread) -> Self {
        Self {
            pipeline,
            renderer,
            main,
            request: LocationRequest::complication(),
            subscriptions: Subscriptions::new(),
        }
    }

    /// Override the location request (the default is a single 30s fix).
    pub fn with_request(mut self, request: LocationRequest) -> Self {
        self.request = request;
        self
    }

    /// Handle a host request.
    ///
    /// Returns false if the provider has been destroyed; the handle is then
    /// dropped unanswered.
    pub fn on_complication_request(&self, request: ComplicationRequest, handle: ResponseHandle) -> bool {
        tracing::debug!("complication request {:?}", request);

        if self.subscriptions.is_disposed() {
            tracing::debug!("provider destroyed, refusing request {}", request.token);
            return false;
        }

        if !request.kind.is_supported() {
            tracing::warn!("unexpected complication kind {}", request.kind);
            return self.main.post(move || handle.respond(None));
        }

        let pipeline = self.pipeline.clone();
        let renderer = self.renderer.clone();
        let main = self.main.clone();
        let location_request = self.request.clone();
        let subscriptions = self.subscriptions.clone();

        let started = self.subscriptions.spawn(async move {
            let result = pipeline.resolve(&location_request).await;
            if let Err(e) = &result {
                tracing::warn!("error retrieving location for {}: {}", request.token, e);
            }

            let data = renderer.render(request.kind, result.as_ref().ok(), Utc::now());

            main.post(move || {
                if subscriptions.is_disposed() {
                    return;
                }
                handle.respond(data);
            });
        });

        started.is_some()
    }

    /// Sample payload for the host's configuration UI. Never resolves.
    pub fn preview(&self, kind: ComplicationKind) -> Option<ComplicationData> {
        self.renderer.preview(kind, Utc::now())
    }

    /// Requests still being resolved.
    pub fn in_flight(&self) -> usize {
        self.subscriptions.active()
    }

    /// Tear the provider down, cancelling every outstanding request.
    pub fn on_destroy(&self) {
        tracing::info!("complication provider destroyed");
        self.subscriptions.dispose();
    }
}
