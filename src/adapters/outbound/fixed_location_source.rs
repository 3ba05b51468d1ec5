//! Fixed Location Source
//!
//! Implements LocationSource for a device that never moves: every fix
//! carries the configured coordinates and the current time.

use crate::domain::entities::Location;
use crate::domain::ports::LocationSource;
use crate::domain::services::LocationUpdates;
use crate::domain::value_objects::LocationRequest;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Spacing of fixes when the request does not ask for an interval.
const MIN_EMIT_INTERVAL: Duration = Duration::from_secs(1);

pub struct FixedLocationSource {
    latitude: f64,
    longitude: f64,
}

impl FixedLocationSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn fix(&self) -> Location {
        Location::new(self.latitude, self.longitude, Utc::now())
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn is_last_location_available(&self) -> bool {
        true
    }

    async fn last_location(&self) -> Option<Location> {
        Some(self.fix())
    }

    fn location_updates(&self, request: &LocationRequest) -> LocationUpdates {
        let (tx, updates) = LocationUpdates::channel(request.clone());
        let (latitude, longitude) = (self.latitude, self.longitude);
        let every = request.interval.max(MIN_EMIT_INTERVAL);

        let producer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let fix = Location::new(latitude, longitude, Utc::now());
                if tx.send(fix).await.is_err() {
                    return;
                }
            }
        });

        updates.with_producer(producer)
    }
}
