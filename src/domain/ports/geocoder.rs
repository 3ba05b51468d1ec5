//! Geocoder Port
//!
//! Defines the interface for resolving coordinates to postal addresses.

use crate::domain::entities::{Address, Location};
use async_trait::async_trait;

/// Reverse geocoding service.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a fix to an address.
    ///
    /// Returns `Ok(None)` when the service has no match for the
    /// coordinates and `Err` when the service itself failed.
    async fn reverse_geocode(&self, location: &Location) -> anyhow::Result<Option<Address>>;
}
