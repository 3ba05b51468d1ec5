//! Mock port implementations shared by the application tests.

use crate::domain::entities::{Address, Location, LocationRecord};
use crate::domain::ports::{
    ComplicationHost, Geocoder, LocationSource, LocationStore, PermissionGate, TextView,
};
use crate::domain::services::LocationUpdates;
use crate::domain::value_objects::LocationRequest;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ===== Permission =====

pub struct MockPermissionGate {
    granted: AtomicBool,
    grant_on_request: bool,
    pub requests: AtomicUsize,
}

impl MockPermissionGate {
    pub fn granted() -> Self {
        Self {
            granted: AtomicBool::new(true),
            grant_on_request: true,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn denied() -> Self {
        Self {
            granted: AtomicBool::new(false),
            grant_on_request: false,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

#[async_trait]
impl PermissionGate for MockPermissionGate {
    fn has_location_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn request_location_permission(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.grant_on_request {
            self.granted.store(true, Ordering::SeqCst);
        }
        self.granted.load(Ordering::SeqCst)
    }
}

// ===== Location source =====

/// Decrements the active subscription count when the producer goes away.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockLocationSource {
    last: Option<Location>,
    fixes: Vec<Location>,
    delay: Duration,
    pub subscriptions: AtomicUsize,
    pub active: Arc<AtomicUsize>,
}

impl MockLocationSource {
    /// A source with a cached last fix.
    pub fn with_last(location: Location) -> Self {
        Self {
            last: Some(location),
            fixes: Vec::new(),
            delay: Duration::ZERO,
            subscriptions: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source without a cached fix that emits `fixes` after `delay` each.
    pub fn with_updates(fixes: Vec<Location>, delay: Duration) -> Self {
        Self {
            last: None,
            fixes,
            delay,
            subscriptions: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that never produces a fix.
    pub fn silent() -> Self {
        Self::with_updates(Vec::new(), Duration::ZERO)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for MockLocationSource {
    async fn is_last_location_available(&self) -> bool {
        self.last.is_some()
    }

    async fn last_location(&self) -> Option<Location> {
        self.last.clone()
    }

    fn location_updates(&self, request: &LocationRequest) -> LocationUpdates {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);

        let (tx, updates) = LocationUpdates::channel(request.clone());
        let guard = ActiveGuard(self.active.clone());
        let fixes = self.fixes.clone();
        let delay = self.delay;

        let producer = tokio::spawn(async move {
            let _guard = guard;
            for fix in fixes {
                tokio::time::sleep(delay).await;
                if tx.send(fix).await.is_err() {
                    return;
                }
            }
            // Keep the subscription open like real hardware would.
            std::future::pending::<()>().await;
        });

        updates.with_producer(producer)
    }
}

// ===== Geocoder =====

pub enum GeocodeBehavior {
    Found(Address),
    NoMatch,
    Fail(String),
}

pub struct MockGeocoder {
    behavior: GeocodeBehavior,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn found(address: Address) -> Self {
        Self::new(GeocodeBehavior::Found(address))
    }

    pub fn no_match() -> Self {
        Self::new(GeocodeBehavior::NoMatch)
    }

    pub fn failing(message: &str) -> Self {
        Self::new(GeocodeBehavior::Fail(message.to_string()))
    }

    fn new(behavior: GeocodeBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn reverse_geocode(&self, _location: &Location) -> anyhow::Result<Option<Address>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            GeocodeBehavior::Found(address) => Ok(Some(address.clone())),
            GeocodeBehavior::NoMatch => Ok(None),
            GeocodeBehavior::Fail(message) => Err(anyhow::anyhow!(message.clone())),
        }
    }
}

// ===== Host / view / store =====

#[derive(Default)]
pub struct MockHost {
    pub refreshes: AtomicUsize,
}

impl MockHost {
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl ComplicationHost for MockHost {
    fn request_update_all(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingTextView {
    pub texts: Mutex<Vec<String>>,
}

impl RecordingTextView {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

impl TextView for RecordingTextView {
    fn set_text(&self, text: &str) {
        self.texts.lock().push(text.to_string());
    }
}

#[derive(Default)]
pub struct MemoryLocationStore {
    pub record: Mutex<Option<LocationRecord>>,
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn latest(&self) -> anyhow::Result<Option<LocationRecord>> {
        Ok(self.record.lock().clone())
    }

    async fn upsert(&self, record: &LocationRecord) -> anyhow::Result<()> {
        *self.record.lock() = Some(record.clone());
        Ok(())
    }

    async fn insert_initial(&self) -> anyhow::Result<bool> {
        let mut guard = self.record.lock();
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(LocationRecord::unknown());
        Ok(true)
    }
}

// ===== Fixtures =====

pub fn main_street() -> Address {
    Address {
        country_name: Some("United States".to_string()),
        thoroughfare: Some("Main St".to_string()),
        sub_thoroughfare: Some("100".to_string()),
    }
}

pub fn fix_minutes_ago(minutes: i64) -> Location {
    Location::new(37.4220, -122.0841, Utc::now() - ChronoDuration::minutes(minutes))
}
