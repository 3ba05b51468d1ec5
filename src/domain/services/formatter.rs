//! Description Formatter
//!
//! Turns a resolved (location, address) pair, or the lack of one, into the
//! user-facing strings shown by the activity and the complications.

use crate::domain::entities::{Address, Location};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Shown instead of a time label when there is no fix.
pub const NO_TIME: &str = "--";

/// User-visible strings. Templates use `{address}` and `{time}` placeholders.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Strings {
    pub no_location: String,
    pub location_error: String,
    pub address_as_of_time_ago: String,
    pub address_as_of_time_activity: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            no_location: "No location".to_string(),
            location_error: "Location error".to_string(),
            address_as_of_time_ago: "{address}, {time}".to_string(),
            address_as_of_time_activity: "You were at {address} {time}".to_string(),
        }
    }
}

/// Pure formatting of pipeline results.
///
/// Every time-dependent method takes `now` explicitly.
#[derive(Debug, Clone, Default)]
pub struct DescriptionFormatter {
    strings: Strings,
}

impl DescriptionFormatter {
    pub fn new(strings: Strings) -> Self {
        Self { strings }
    }

    pub fn strings(&self) -> &Strings {
        &self.strings
    }

    /// Single-unit elapsed time ("now", "5m", "2h", "3d"), or `--` without a fix.
    ///
    /// Only the most significant unit is shown, rounded up: elapsed time is
    /// ceiled to whole minutes, then to hours, then to days. Under one
    /// minute (and fixes from the future) reads "now".
    pub fn short_time_ago(&self, location: Option<&Location>, now: DateTime<Utc>) -> String {
        let Some(location) = location else {
            return NO_TIME.to_string();
        };

        let seconds = (now - location.time).num_seconds();
        if seconds < 60 {
            return "now".to_string();
        }

        let minutes = div_ceil(seconds, 60);
        if minutes < 60 {
            return format!("{}m", minutes);
        }

        let hours = div_ceil(minutes, 60);
        if hours < 24 {
            return format!("{}h", hours);
        }

        format!("{}d", div_ceil(hours, 24))
    }

    /// Sentence-style relative time ("just now", "5 minutes ago").
    pub fn relative_time(&self, time: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let minutes = (now - time).num_minutes();
        let (count, unit) = if minutes < 1 {
            return "just now".to_string();
        } else if minutes < 60 {
            (minutes, "minute")
        } else if minutes < 60 * 24 {
            (minutes / 60, "hour")
        } else {
            (minutes / (60 * 24), "day")
        };

        if count == 1 {
            format!("1 {} ago", unit)
        } else {
            format!("{} {}s ago", count, unit)
        }
    }

    /// Street-level label for an address.
    ///
    /// A house number is only shown alongside a street; without a street
    /// the country name is used.
    pub fn address_label(&self, address: Option<&Address>) -> String {
        let Some(address) = address else {
            return self.strings.no_location.clone();
        };

        match &address.thoroughfare {
            Some(thoroughfare) => match address.sub_thoroughfare.as_deref() {
                Some(sub) if !sub.is_empty() => format!("{} {}", sub, thoroughfare),
                _ => thoroughfare.clone(),
            },
            None => address
                .country_name
                .clone()
                .unwrap_or_else(|| self.strings.no_location.clone()),
        }
    }

    /// Address label and relative time in one sentence.
    pub fn full_description(
        &self,
        location: Option<&Location>,
        address: Option<&Address>,
        now: DateTime<Utc>,
    ) -> String {
        match (location, address) {
            (Some(location), Some(address)) => fill(
                &self.strings.address_as_of_time_ago,
                &self.address_label(Some(address)),
                &self.relative_time(location.time, now),
            ),
            _ => self.strings.no_location.clone(),
        }
    }

    /// Full-screen text for the interactive display.
    pub fn activity_text(&self, location: &Location, address: &Address, now: DateTime<Utc>) -> String {
        fill(
            &self.strings.address_as_of_time_activity,
            &self.address_label(Some(address)),
            &self.relative_time(location.time, now),
        )
    }

    pub fn location_error(&self) -> String {
        self.strings.location_error.clone()
    }

    pub fn no_location(&self) -> String {
        self.strings.no_location.clone()
    }
}

fn div_ceil(value: i64, unit: i64) -> i64 {
    (value + unit - 1) / unit
}

fn fill(template: &str, address: &str, time: &str) -> String {
    template.replace("{address}", address).replace("{time}", time)
}
