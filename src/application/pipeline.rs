//! Location Pipeline - permission, location, address
//!
//! Runs the resolve sequence shared by every surface. Each call owns its
//! own location subscription, so concurrent runs share no state.

use crate::domain::entities::{Address, Location, ResolvedLocation};
use crate::domain::error::{GeocodeFailure, ResolveError};
use crate::domain::ports::{Geocoder, LocationSource, PermissionGate};
use crate::domain::services::LocationUpdates;
use crate::domain::value_objects::LocationRequest;
use std::sync::Arc;
use std::time::Instant;

/// Resolves the device position to an address.
///
/// 1. Fails fast without fine location permission
/// 2. Uses the last known fix if the source has one ready,
///    otherwise waits for the first fix of a bounded subscription
/// 3. Reverse geocodes the fix, without retrying
pub struct LocationPipeline {
    permissions: Arc<dyn PermissionGate>,
    source: Arc<dyn LocationSource>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationPipeline {
    pub fn new(
        permissions: Arc<dyn PermissionGate>,
        source: Arc<dyn LocationSource>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            permissions,
            source,
            geocoder,
        }
    }

    pub fn has_location_permission(&self) -> bool {
        self.permissions.has_location_permission()
    }

    /// Run the whole pipeline.
    pub async fn resolve(&self, request: &LocationRequest) -> Result<ResolvedLocation, ResolveError> {
        if !self.permissions.has_location_permission() {
            tracing::debug!("no fine location permission, not resolving");
            return Err(ResolveError::PermissionDenied);
        }

        self.resolve_granted(request).await
    }

    /// Run the pipeline when the caller already established permission,
    /// e.g. through an interactive request.
    pub async fn resolve_granted(
        &self,
        request: &LocationRequest,
    ) -> Result<ResolvedLocation, ResolveError> {
        let location = self.resolve_location(request).await?;
        let address = self.resolve_address(&location).await?;
        Ok(ResolvedLocation::new(location, address))
    }

    /// Obtain one representative fix.
    pub async fn resolve_location(&self, request: &LocationRequest) -> Result<Location, ResolveError> {
        let start = Instant::now();

        let result = if self.source.is_last_location_available().await {
            match self.source.last_location().await {
                Some(location) => Ok(location),
                None => self.first_update(request).await,
            }
        } else {
            self.first_update(request).await
        };

        tracing::info!(
            "location resolution took {}ms (priority={})",
            start.elapsed().as_millis(),
            request.priority
        );
        result
    }

    /// Open a subscription on the underlying source. The caller owns it.
    pub fn location_updates(&self, request: &LocationRequest) -> LocationUpdates {
        self.source.location_updates(request)
    }

    async fn first_update(&self, request: &LocationRequest) -> Result<Location, ResolveError> {
        let mut updates = self.source.location_updates(request);
        let fix = updates.next().await;
        updates.release();

        fix.ok_or(ResolveError::LocationUnavailable)
    }

    /// Reverse geocode a fix.
    pub async fn resolve_address(&self, location: &Location) -> Result<Address, ResolveError> {
        let start = Instant::now();
        let result = self.geocoder.reverse_geocode(location).await;
        tracing::info!("reverse geocoding took {}ms", start.elapsed().as_millis());

        match result {
            Ok(Some(address)) => Ok(address),
            Ok(None) => {
                tracing::debug!(
                    "no address for {},{}",
                    location.latitude,
                    location.longitude
                );
                Err(ResolveError::GeocodingFailed(GeocodeFailure::NoMatch))
            }
            Err(e) => {
                tracing::warn!("reverse geocoding failed: {:#}", e);
                Err(ResolveError::GeocodingFailed(GeocodeFailure::Service(
                    e.to_string(),
                )))
            }
        }
    }
}
