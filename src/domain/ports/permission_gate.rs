//! Permission Gate Port
//!
//! Defines the interface for checking and requesting fine location access.

use async_trait::async_trait;

/// Access control for location services.
///
/// Callers check this before touching any location API and fail fast
/// when it reports no access.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Whether fine location access is currently granted. No side effects.
    fn has_location_permission(&self) -> bool;

    /// Ask the user for fine location access.
    ///
    /// Used by interactive surfaces only; resolves to the resulting grant.
    async fn request_location_permission(&self) -> bool;
}
