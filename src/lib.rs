//! where-am-i Library
//!
//! This module exposes the where-am-i components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{
    ActivitySession, ActivityState, ComplicationProvider, ComplicationRequest, LocationPipeline,
    LocationRecorder, ResponseHandle, UpdateHandler,
};
pub use config::{load_config, Config};
pub use domain::entities::{Address, Location, LocationRecord, ResolvedLocation};
pub use domain::error::{GeocodeFailure, ResolveError};
pub use domain::ports::{
    ComplicationHost, Geocoder, LocationSource, LocationStore, PermissionGate, TextView,
};
pub use domain::services::{
    ComplicationData, ComplicationRenderer, DescriptionFormatter, LocationUpdates, Strings,
};
pub use domain::value_objects::{ComplicationKind, ErrorType, Freshness, LocationRequest, Priority};
pub use infrastructure::{MainThread, Subscriptions};
