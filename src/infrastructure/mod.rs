//! Infrastructure Layer
//!
//! Cross-cutting concerns: thread affinity and run cancellation.

pub mod main_thread;
pub mod subscriptions;

pub use main_thread::{MainThread, MAIN_THREAD_NAME};
pub use subscriptions::{SubscriptionId, Subscriptions};
