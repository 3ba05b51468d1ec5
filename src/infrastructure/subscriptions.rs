//! In-flight run tracking.
//!
//! A surface owns a [`Subscriptions`] set; every pipeline run it starts is
//! spawned through it, and tearing the surface down disposes the set so
//! nothing started by it outlives it.

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Identifier of a tracked run.
pub type SubscriptionId = u64;

struct Inner {
    next_id: AtomicU64,
    handles: DashMap<SubscriptionId, AbortHandle>,
    disposed: AtomicBool,
}

/// Set of cancellable tasks that are aborted together.
#[derive(Clone)]
pub struct Subscriptions {
    inner: Arc<Inner>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                handles: DashMap::new(),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Spawn `task` as a tracked run.
    ///
    /// Returns `None` without spawning once the set has been disposed.
    pub fn spawn<F>(&self, task: F) -> Option<SubscriptionId>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_disposed() {
            tracing::debug!("subscriptions disposed, not starting run");
            return None;
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            task.await;
            inner.handles.remove(&id);
        });

        self.inner.handles.insert(id, handle.abort_handle());

        // The task may have completed before it was registered, or the set
        // may have been disposed in between.
        if handle.is_finished() {
            self.inner.handles.remove(&id);
        } else if self.is_disposed() {
            handle.abort();
            self.inner.handles.remove(&id);
        }

        Some(id)
    }

    /// Abort a single run. Returns whether it was still active.
    pub fn cancel(&self, id: SubscriptionId) -> bool {
        match self.inner.handles.remove(&id) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every run and refuse new ones.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let ids: Vec<SubscriptionId> = self.inner.handles.iter().map(|e| *e.key()).collect();
        let count = ids.len();
        for id in ids {
            self.cancel(id);
        }

        if count > 0 {
            tracing::debug!("disposed {} in-flight runs", count);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of runs still in flight.
    pub fn active(&self) -> usize {
        self.inner.handles.len()
    }
}

impl Default for Subscriptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completed_runs_are_forgotten() {
        let subs = Subscriptions::new();
        subs.spawn(async {}).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(subs.active(), 0);
    }

    #[tokio::test]
    async fn test_dispose_aborts_pending_runs() {
        let subs = Subscriptions::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        subs.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let _ = tx.send(());
        })
        .unwrap();
        assert_eq!(subs.active(), 1);

        subs.dispose();
        assert!(subs.is_disposed());
        assert_eq!(subs.active(), 0);

        // Sender dropped by the abort, never sent
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_spawn_after_dispose_is_refused() {
        let subs = Subscriptions::new();
        subs.dispose();
        assert!(subs.spawn(async {}).is_none());
    }

    #[tokio::test]
    async fn test_cancel_single_run() {
        let subs = Subscriptions::new();
        let a = subs
            .spawn(tokio::time::sleep(Duration::from_secs(60)))
            .unwrap();
        let _b = subs
            .spawn(tokio::time::sleep(Duration::from_secs(60)))
            .unwrap();

        assert!(subs.cancel(a));
        assert!(!subs.cancel(a));
        assert_eq!(subs.active(), 1);
        assert!(!subs.is_disposed());
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let subs = Subscriptions::default();
        subs.dispose();
        subs.dispose();
        assert!(subs.is_disposed());
    }
}
