//! Logging Complication Host
//!
//! Implements ComplicationHost for a headless host: refresh-all requests
//! are logged and counted so the HTTP bridge can report them.

use crate::domain::ports::ComplicationHost;
use crate::domain::services::ACTIVITY_COMPONENT;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct LoggingComplicationHost {
    refreshes: AtomicU64,
}

impl LoggingComplicationHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refresh-all requests received.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl ComplicationHost for LoggingComplicationHost {
    fn request_update_all(&self) {
        let count = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            "refresh of all complications requested by {} (#{})",
            ACTIVITY_COMPONENT,
            count
        );
    }
}
