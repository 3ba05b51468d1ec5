//! Config Permission Gate
//!
//! Implements PermissionGate with a grant flag seeded from configuration.
//! The interactive request grants access, like a user accepting a prompt.

use crate::domain::ports::PermissionGate;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct ConfigPermissionGate {
    granted: AtomicBool,
}

impl ConfigPermissionGate {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    /// Revoke or grant access at runtime.
    pub fn set_granted(&self, granted: bool) {
        tracing::info!("fine location permission set to {}", granted);
        self.granted.store(granted, Ordering::SeqCst);
    }
}

#[async_trait]
impl PermissionGate for ConfigPermissionGate {
    fn has_location_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn request_location_permission(&self) -> bool {
        if !self.granted.swap(true, Ordering::SeqCst) {
            tracing::info!("fine location permission granted on request");
        }
        true
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_grants_permission() {
        let gate = ConfigPermissionGate::new(false);
        assert!(!gate.has_location_permission());
        assert!(gate.request_location_permission().await);
        assert!(gate.has_location_permission());
    }

    #[test]
    fn test_revoke() {
        let gate = ConfigPermissionGate::new(true);
        gate.set_granted(false);
        assert!(!gate.has_location_permission());
    }
}
