//! Adapters Layer
//!
//! Inbound adapters drive the application (the HTTP host bridge);
//! outbound adapters implement the domain ports.

pub mod inbound;
pub mod outbound;
