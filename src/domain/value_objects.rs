//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Accuracy/power trade-off requested from the location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Most accurate fix available (GPS), highest power draw
    HighAccuracy,
    /// Block-level accuracy, moderate power draw
    BalancedPower,
    /// City-level accuracy
    LowPower,
    /// Only piggy-back on fixes requested by others
    Passive,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighAccuracy => "high_accuracy",
            Self::BalancedPower => "balanced_power",
            Self::LowPower => "low_power",
            Self::Passive => "passive",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters of a location update subscription.
///
/// `None` for `num_updates` means unbounded; `None` for `expiration`
/// means the subscription lives until it is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRequest {
    pub priority: Priority,
    /// Minimum spacing between delivered fixes (by fix timestamp)
    pub interval: Duration,
    /// Minimum distance in meters between delivered fixes
    pub smallest_displacement_m: f64,
    pub num_updates: Option<u32>,
    pub expiration: Option<Duration>,
}

impl LocationRequest {
    /// Continuous high-accuracy updates for the interactive display.
    pub fn activity() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval: Duration::from_secs(10),
            smallest_displacement_m: 50.0,
            num_updates: None,
            expiration: None,
        }
    }

    /// A single balanced-power fix that expires after 30 seconds.
    pub fn complication() -> Self {
        Self {
            priority: Priority::BalancedPower,
            interval: Duration::ZERO,
            smallest_displacement_m: 0.0,
            num_updates: Some(1),
            expiration: Some(Duration::from_secs(30)),
        }
    }
}

/// Kind of complication data the watch face host asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplicationKind {
    ShortText,
    LongText,
    RangedValue,
    MonochromaticImage,
    SmallImage,
    PhotoImage,
}

impl ComplicationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::RangedValue => "ranged_value",
            Self::MonochromaticImage => "monochromatic_image",
            Self::SmallImage => "small_image",
            Self::PhotoImage => "photo_image",
        }
    }

    /// Whether this provider can render the kind.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::ShortText | Self::LongText)
    }
}

impl fmt::Display for ComplicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a complication kind string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown complication kind: {0}")]
pub struct UnknownComplicationKind(pub String);

impl FromStr for ComplicationKind {
    type Err = UnknownComplicationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "short_text" => Ok(Self::ShortText),
            "long_text" => Ok(Self::LongText),
            "ranged_value" => Ok(Self::RangedValue),
            "monochromatic_image" => Ok(Self::MonochromaticImage),
            "small_image" => Ok(Self::SmallImage),
            "photo_image" => Ok(Self::PhotoImage),
            _ => Err(UnknownComplicationKind(s.to_string())),
        }
    }
}

/// Why a stored location record carries no name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    NoPermission,
    Failed,
    Timeout,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPermission => "NoPermission",
            Self::Failed => "Failed",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NoPermission" => Some(Self::NoPermission),
            "Failed" => Some(Self::Failed),
            "Timeout" => Some(Self::Timeout),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How trustworthy a stored record is, best first.
///
/// The declaration order is the ranking used by [`Freshness::cmp`]:
/// an exact fix that is a few minutes old still beats a fresh error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Freshness {
    FreshExact,
    StaleExact,
    FreshError,
    StaleError,
    Unknown,
    OldExact,
    OldError,
}

impl Freshness {
    fn rank(&self) -> u8 {
        match self {
            Self::FreshExact => 0,
            Self::StaleExact => 1,
            Self::FreshError => 2,
            Self::StaleError => 3,
            Self::Unknown => 4,
            Self::OldExact => 5,
            Self::OldError => 6,
        }
    }
}

impl PartialOrd for Freshness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Freshness {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}
