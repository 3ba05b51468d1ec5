//! Location Source Port
//!
//! Defines the interface for obtaining position fixes.
//! Implementations may read a fixed position, gpsd, or a platform API.

use crate::domain::entities::Location;
use crate::domain::services::LocationUpdates;
use crate::domain::value_objects::LocationRequest;
use async_trait::async_trait;

/// Source of location fixes.
///
/// This is an outbound port that abstracts the positioning hardware.
/// Subscriptions are returned as [`LocationUpdates`], which enforce the
/// request and release the source when dropped.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Whether a recent fix can be returned without waiting.
    async fn is_last_location_available(&self) -> bool;

    /// The most recent known fix, if any.
    async fn last_location(&self) -> Option<Location>;

    /// Subscribe to fresh fixes according to `request`.
    fn location_updates(&self, request: &LocationRequest) -> LocationUpdates;
}
