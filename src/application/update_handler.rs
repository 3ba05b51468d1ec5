//! Update Handler - decides when the host should refresh
//!
//! Only records that beat the previous one on freshness trigger a refresh.
//! Refreshes closer together than the throttle window are followed by one
//! delayed refresh, so the host still ends up showing the latest record.

use crate::domain::entities::LocationRecord;
use crate::domain::ports::ComplicationHost;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default spacing between forced refreshes.
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(30);

struct HandlerState {
    last: LocationRecord,
    update_sent: Option<Instant>,
}

pub struct UpdateHandler {
    host: Arc<dyn ComplicationHost>,
    throttle: Duration,
    state: Mutex<HandlerState>,
    sent: AtomicUsize,
}

impl UpdateHandler {
    pub fn new(host: Arc<dyn ComplicationHost>, throttle: Duration) -> Self {
        Self {
            host,
            throttle,
            state: Mutex::new(HandlerState {
                last: LocationRecord::unknown(),
                update_sent: None,
            }),
            sent: AtomicUsize::new(0),
        }
    }

    /// Offer a new record. Returns whether it triggered a refresh.
    pub fn process(self: &Arc<Self>, record: LocationRecord) -> bool {
        let now = Utc::now();

        let recently_sent = {
            let mut state = self.state.lock();
            let is_newer = record.newer(&state.last, now);
            tracing::info!(
                "freshness check: old: {:?} new: {:?} is_newer: {} time: {}",
                state.last.freshness(now),
                record.freshness(now),
                is_newer,
                record.time
            );

            if !is_newer {
                tracing::info!("dropping update");
                return false;
            }

            state.last = record;
            state
                .update_sent
                .map(|sent| sent.elapsed() < self.throttle)
                .unwrap_or(false)
        };

        if recently_sent {
            tracing::info!("also sending a delayed update");
            let this = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(this.throttle).await;
                this.send_update();
            });
        }

        self.send_update();
        true
    }

    fn send_update(&self) {
        self.state.lock().update_sent = Some(Instant::now());
        self.sent.fetch_add(1, Ordering::SeqCst);
        tracing::info!("forcing complication updates");
        self.host.request_update_all();
    }

    /// Total refreshes requested from the host.
    pub fn updates_sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    /// The last record that triggered a refresh.
    pub fn last(&self) -> LocationRecord {
        self.state.lock().last.clone()
    }
}
