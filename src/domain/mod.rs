//! Domain Layer
//!
//! Entities, value objects, pure services and the outbound ports the
//! application layer drives.

pub mod entities;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{Address, Location, LocationRecord, ResolvedLocation};
pub use error::{GeocodeFailure, ResolveError};
pub use value_objects::{
    ComplicationKind, ErrorType, Freshness, LocationRequest, Priority, UnknownComplicationKind,
};
