//! Bounded location update subscription.
//!
//! Location sources push raw fixes into a channel; [`LocationUpdates`]
//! applies the [`LocationRequest`] on the consuming side so every source
//! honours update count, expiration, interval and displacement the same way.

use crate::domain::entities::Location;
use crate::domain::value_objects::LocationRequest;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Capacity of the raw fix channel between a source and its subscriber.
pub const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// A live subscription to location fixes.
///
/// Dropping it aborts the producing task, which releases whatever the
/// source holds open for it.
pub struct LocationUpdates {
    request: LocationRequest,
    rx: mpsc::Receiver<Location>,
    producer: Option<JoinHandle<()>>,
    deadline: Option<Instant>,
    delivered: u32,
    last: Option<Location>,
}

impl LocationUpdates {
    /// Wrap a raw fix channel. The expiration clock starts now.
    pub fn new(
        request: LocationRequest,
        rx: mpsc::Receiver<Location>,
        producer: Option<JoinHandle<()>>,
    ) -> Self {
        let deadline = request.expiration.map(|e| Instant::now() + e);
        Self {
            request,
            rx,
            producer,
            deadline,
            delivered: 0,
            last: None,
        }
    }

    /// Create a subscription fed by the returned sender.
    pub fn channel(request: LocationRequest) -> (mpsc::Sender<Location>, Self) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        (tx, Self::new(request, rx, None))
    }

    /// Attach the task producing fixes so it is aborted with the subscription.
    pub fn with_producer(mut self, producer: JoinHandle<()>) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn request(&self) -> &LocationRequest {
        &self.request
    }

    /// Number of fixes handed out so far.
    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    /// Next fix satisfying the request, or `None` once the update count is
    /// exhausted, the request expired, or the source stopped.
    pub async fn next(&mut self) -> Option<Location> {
        if let Some(max) = self.request.num_updates {
            if self.delivered >= max {
                self.release();
                return None;
            }
        }

        loop {
            let received = match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                    Ok(fix) => fix,
                    Err(_) => {
                        tracing::debug!(
                            "location request expired after {:?}",
                            self.request.expiration
                        );
                        None
                    }
                },
                None => self.rx.recv().await,
            };

            let Some(fix) = received else {
                self.release();
                return None;
            };

            if !self.accepts(&fix) {
                tracing::trace!("dropping fix at {},{}", fix.latitude, fix.longitude);
                continue;
            }

            self.delivered += 1;
            self.last = Some(fix.clone());
            return Some(fix);
        }
    }

    fn accepts(&self, fix: &Location) -> bool {
        let Some(last) = &self.last else {
            return true;
        };

        let interval = chrono::Duration::from_std(self.request.interval)
            .unwrap_or_else(|_| chrono::Duration::zero());
        if fix.time - last.time < interval {
            return false;
        }

        last.distance_to(fix) >= self.request.smallest_displacement_m
    }

    /// Stop the producer and close the channel. Idempotent.
    pub fn release(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
        self.rx.close();
    }

    /// Whether the subscription has been released.
    pub fn is_released(&self) -> bool {
        self.producer.is_none() && self.rx.is_closed()
    }
}

impl Drop for LocationUpdates {
    fn drop(&mut self) {
        self.release();
    }
}
