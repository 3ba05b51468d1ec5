//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the where-am-i domain.
//! They have no external dependencies beyond time and serialization.

use crate::domain::value_objects::{ErrorType, Freshness};
use chrono::{DateTime, Duration as ChronoDuration, Local, Utc};
use serde::{Deserialize, Serialize};

/// A single position fix reported by a location source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// When the fix was taken
    pub time: DateTime<Utc>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, time: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            time,
        }
    }

    /// Great-circle distance to another fix, in meters.
    pub fn distance_to(&self, other: &Location) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// Postal address resolved for a [`Location`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    pub country_name: Option<String>,
    /// Street name
    pub thoroughfare: Option<String>,
    /// House number or similar qualifier within the street
    pub sub_thoroughfare: Option<String>,
}

impl Address {
    pub fn country(name: impl Into<String>) -> Self {
        Self {
            country_name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// A fix together with its address.
///
/// Only ever constructed with both halves, so a partially
/// resolved pair cannot reach formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub location: Location,
    pub address: Address,
}

impl ResolvedLocation {
    pub fn new(location: Location, address: Address) -> Self {
        Self { location, address }
    }
}

/// Latest pipeline outcome as persisted by the location store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub error: Option<ErrorType>,
    pub error_message: Option<String>,
    pub time: DateTime<Utc>,
}

impl LocationRecord {
    /// Records younger than this are fresh.
    pub fn fresh_window() -> ChronoDuration {
        ChronoDuration::minutes(3)
    }

    /// Records younger than this are merely stale.
    pub fn stale_window() -> ChronoDuration {
        ChronoDuration::minutes(20)
    }

    pub fn named(location: &Location, name: impl Into<String>) -> Self {
        Self {
            latitude: Some(location.latitude),
            longitude: Some(location.longitude),
            location_name: Some(name.into()),
            error: None,
            error_message: None,
            time: location.time,
        }
    }

    pub fn error(error: ErrorType, message: Option<String>) -> Self {
        Self {
            latitude: None,
            longitude: None,
            location_name: None,
            error: Some(error),
            error_message: message,
            time: Utc::now(),
        }
    }

    pub fn permission_error() -> Self {
        Self::error(ErrorType::NoPermission, None)
    }

    pub fn unknown() -> Self {
        Self::error(ErrorType::Unknown, None)
    }

    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        let age = now - self.time;
        let fresh = Self::fresh_window();
        let stale = Self::stale_window();
        let named = self.location_name.is_some();
        let errored = self.error.is_some();

        if self.error == Some(ErrorType::Unknown) {
            Freshness::Unknown
        } else if age < fresh && named {
            Freshness::FreshExact
        } else if age < stale && named {
            Freshness::StaleExact
        } else if age < fresh && errored {
            Freshness::FreshError
        } else if age < stale && errored {
            Freshness::StaleError
        } else if named {
            Freshness::OldExact
        } else if errored {
            Freshness::OldError
        } else {
            Freshness::Unknown
        }
    }

    /// Whether this record should replace `last`.
    pub fn newer(&self, last: &LocationRecord, now: DateTime<Utc>) -> bool {
        let this = self.freshness(now);
        let that = last.freshness(now);
        this < that || (this == that && self.time > last.time)
    }

    pub fn description(&self) -> String {
        if let Some(name) = &self.location_name {
            return name.clone();
        }
        if let Some(message) = &self.error_message {
            return message.clone();
        }
        match self.error {
            Some(error) => error.to_string(),
            None => ErrorType::Unknown.to_string(),
        }
    }

    /// Short local wall-clock time, e.g. "12:31 PM".
    pub fn formatted_time(&self) -> String {
        self.time.with_timezone(&Local).format("%-I:%M %p").to_string()
    }
}
