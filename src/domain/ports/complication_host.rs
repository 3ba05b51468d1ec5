//! Complication Host Port
//!
//! The watch face side of the complication contract.

/// Host that displays this provider's complications.
///
/// Individual requests are answered through a
/// [`ResponseHandle`](crate::application::ResponseHandle); this port only
/// covers what the provider can ask of the host unprompted.
pub trait ComplicationHost: Send + Sync {
    /// Ask the host to re-request data for every complication backed by
    /// this provider. Fire and forget.
    fn request_update_all(&self);
}
