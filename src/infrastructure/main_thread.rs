//! UI-affinity executor.
//!
//! Host callbacks and text view updates must all happen on one thread.
//! [`MainThread`] owns a dedicated OS thread that runs posted closures in
//! order, the way a platform UI looper would.

use std::io;
use tokio::sync::{mpsc, oneshot};

/// Name given to the dedicated thread.
pub const MAIN_THREAD_NAME: &str = "where-am-i-main";

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the main thread. Cheap to clone.
///
/// The thread exits once every handle has been dropped and the queue
/// is drained.
#[derive(Clone)]
pub struct MainThread {
    tx: mpsc::UnboundedSender<Job>,
}

impl MainThread {
    /// Start the main thread.
    pub fn start() -> io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        std::thread::Builder::new()
            .name(MAIN_THREAD_NAME.to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    job();
                }
                tracing::debug!("main thread stopped");
            })?;

        Ok(Self { tx })
    }

    /// Queue `job` to run on the main thread.
    ///
    /// Returns false if the thread is gone and the job was dropped.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(job)).is_ok()
    }

    /// Run `job` on the main thread and wait for its result.
    pub async fn run<F, R>(&self, job: F) -> Option<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        if !self.post(move || {
            let _ = tx.send(job());
        }) {
            return None;
        }
        rx.await.ok()
    }

    /// Wait until everything posted before this call has run.
    pub async fn flush(&self) {
        let _ = self.run(|| ()).await;
    }

    /// Whether the caller is running on the main thread.
    pub fn is_current() -> bool {
        std::thread::current().name() == Some(MAIN_THREAD_NAME)
    }
}
