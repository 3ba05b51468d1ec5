//! Location Recorder - persists pipeline outcomes
//!
//! Turns every resolution, successful or not, into a [`LocationRecord`],
//! stores it as the current record and offers it to the [`UpdateHandler`].

use crate::application::pipeline::LocationPipeline;
use crate::application::update_handler::UpdateHandler;
use crate::domain::entities::{Location, LocationRecord};
use crate::domain::error::{GeocodeFailure, ResolveError};
use crate::domain::ports::LocationStore;
use crate::domain::services::DescriptionFormatter;
use crate::domain::value_objects::{ErrorType, LocationRequest};
use crate::infrastructure::{SubscriptionId, Subscriptions};
use std::sync::Arc;

pub struct LocationRecorder {
    pipeline: Arc<LocationPipeline>,
    store: Arc<dyn LocationStore>,
    update_handler: Arc<UpdateHandler>,
    formatter: DescriptionFormatter,
    request: LocationRequest,
    subscriptions: Subscriptions,
}

impl LocationRecorder {
    pub fn new(
        pipeline: Arc<LocationPipeline>,
        store: Arc<dyn LocationStore>,
        update_handler: Arc<UpdateHandler>,
        formatter: DescriptionFormatter,
    ) -> Self {
        Self {
            pipeline,
            store,
            update_handler,
            formatter,
            request: LocationRequest::complication(),
            subscriptions: Subscriptions::new(),
        }
    }

    /// Override the request used by `read_fresh`.
    pub fn with_request(mut self, request: LocationRequest) -> Self {
        self.request = request;
        self
    }

    /// Seed the store with an Unknown record if it is empty.
    pub async fn initialize(&self) -> anyhow::Result<()> {
        if self.store.insert_initial().await? {
            tracing::info!("location store initialized");
        }
        Ok(())
    }

    pub async fn latest(&self) -> anyhow::Result<Option<LocationRecord>> {
        self.store.latest().await
    }

    /// Resolve now and record the outcome.
    ///
    /// After `shutdown`, including one that lands while the pipeline is
    /// running, fails with [`ResolveError::Cancelled`] and stores nothing.
    pub async fn read_fresh(&self) -> anyhow::Result<LocationRecord> {
        if self.subscriptions.is_disposed() {
            return Err(ResolveError::Cancelled.into());
        }

        let result = self.pipeline.resolve(&self.request).await;
        if self.subscriptions.is_disposed() {
            tracing::debug!("recorder shut down during refresh, discarding result");
            return Err(ResolveError::Cancelled.into());
        }

        let record = match result {
            Ok(resolved) => LocationRecord::named(
                &resolved.location,
                self.formatter.address_label(Some(&resolved.address)),
            ),
            Err(e) => {
                tracing::warn!("location refresh failed: {}", e);
                Self::error_record(e)
            }
        };

        self.record(record).await
    }

    /// Geocode and record a fix pushed by a subscription.
    pub async fn record_fix(&self, location: &Location) -> anyhow::Result<LocationRecord> {
        let record = match self.pipeline.resolve_address(location).await {
            Ok(address) => {
                LocationRecord::named(location, self.formatter.address_label(Some(&address)))
            }
            Err(e) => Self::error_record(e),
        };

        self.record(record).await
    }

    /// Record every fix of a long-lived subscription in the background.
    ///
    /// Returns None without permission or after `shutdown`.
    pub fn watch(self: &Arc<Self>, request: LocationRequest) -> Option<SubscriptionId> {
        if !self.pipeline.has_location_permission() {
            tracing::warn!("no fine location permission, not watching location");
            return None;
        }

        let this = self.clone();
        self.subscriptions.spawn(async move {
            let mut updates = this.pipeline.location_updates(&request);
            tracing::info!("watching location updates (priority={})", request.priority);

            while let Some(location) = updates.next().await {
                if let Err(e) = this.record_fix(&location).await {
                    tracing::error!("failed to record location update: {:#}", e);
                }
            }

            tracing::info!("location updates ended after {} fixes", updates.delivered());
        })
    }

    /// Stop every background subscription.
    pub fn shutdown(&self) {
        self.subscriptions.dispose();
    }

    async fn record(&self, record: LocationRecord) -> anyhow::Result<LocationRecord> {
        self.store.upsert(&record).await?;
        tracing::debug!("stored location record: {}", record.description());
        self.update_handler.process(record.clone());
        Ok(record)
    }

    fn error_record(error: ResolveError) -> LocationRecord {
        match error {
            ResolveError::PermissionDenied => LocationRecord::permission_error(),
            ResolveError::LocationUnavailable => LocationRecord::error(ErrorType::Timeout, None),
            ResolveError::GeocodingFailed(GeocodeFailure::NoMatch) => LocationRecord::unknown(),
            ResolveError::GeocodingFailed(GeocodeFailure::Service(message)) => {
                LocationRecord::error(ErrorType::Failed, Some(message))
            }
            ResolveError::Cancelled => LocationRecord::unknown(),
        }
    }
}
