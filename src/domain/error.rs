//! Resolution failures.

/// Why a pipeline run produced no resolved location.
///
/// Formatting never distinguishes these; they exist for logging and
/// for mapping onto stored [`ErrorType`](crate::domain::value_objects::ErrorType)s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("fine location permission not granted")]
    PermissionDenied,
    #[error("no location fix before the request expired")]
    LocationUnavailable,
    #[error("reverse geocoding failed: {0}")]
    GeocodingFailed(GeocodeFailure),
    /// The owning surface was torn down before the result could be used.
    #[error("resolution cancelled")]
    Cancelled,
}

/// The two ways a reverse geocode can come back empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeFailure {
    /// The service answered but knows no address for the fix.
    #[error("no address found")]
    NoMatch,
    #[error("{0}")]
    Service(String),
}
