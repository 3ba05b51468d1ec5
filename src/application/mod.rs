//! Application Layer
//!
//! Use cases built on the domain ports: the shared resolve pipeline, the
//! two presentation surfaces and persistence of the latest outcome.

pub mod activity;
pub mod complication_provider;
pub mod pipeline;
pub mod recorder;
pub mod update_handler;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity::{ActivitySession, ActivityState};
pub use complication_provider::{ComplicationProvider, ComplicationRequest, ResponseHandle};
pub use pipeline::LocationPipeline;
pub use recorder::LocationRecorder;
pub use update_handler::{UpdateHandler, DEFAULT_THROTTLE};
