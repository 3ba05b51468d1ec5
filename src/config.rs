use crate::domain::services::Strings;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

/// Which surface the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// HTTP complication host bridge
    Serve,
    /// Interactive terminal display
    Activity,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "serve" => Ok(Self::Serve),
            "activity" => Ok(Self::Activity),
            _ => Err(ConfigError::UnknownValue {
                var: "WHEREAMI_MODE",
                value: s.to_string(),
            }),
        }
    }
}

/// Where fixes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSourceKind {
    Fixed,
    Gpsd,
}

impl FromStr for LocationSourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "gpsd" => Ok(Self::Gpsd),
            _ => Err(ConfigError::UnknownValue {
                var: "WHEREAMI_LOCATION_SOURCE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?} as a number")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: unknown value {value:?}")]
    UnknownValue { var: &'static str, value: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub mode: Mode,
    pub listen_addr: String,
    pub db_path: String,
    pub debug: bool,

    // Location source settings
    pub location_source: LocationSourceKind,
    pub fixed_latitude: f64,
    pub fixed_longitude: f64,
    pub gpsd_addr: String,
    pub last_location_max_age_secs: u64,

    // Reverse geocoder settings
    pub geocoder_url: String,
    pub geocoder_user_agent: String,

    pub permission_granted: bool,
    pub strings: Strings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Serve,
            listen_addr: "0.0.0.0:8090".to_string(),
            db_path: "locations.db".to_string(),
            debug: false,
            location_source: LocationSourceKind::Fixed,
            fixed_latitude: 0.0,
            fixed_longitude: 0.0,
            gpsd_addr: "127.0.0.1:2947".to_string(),
            last_location_max_age_secs: 120,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent: default_user_agent(),
            permission_granted: true,
            strings: Strings::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("where-am-i/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_number<T: FromStr>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: v }),
        None => Ok(default),
    }
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(default)
}

pub fn load_config() -> anyhow::Result<Config> {
    Ok(load_config_from(|key| std::env::var(key).ok())?)
}

/// Build the configuration from an arbitrary variable lookup.
pub fn load_config_from<F>(var: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let mode = match var("WHEREAMI_MODE") {
        Some(v) => v.parse()?,
        None => defaults.mode,
    };

    let listen_addr = var("WHEREAMI_LISTEN_ADDR").unwrap_or(defaults.listen_addr);
    let db_path = var("WHEREAMI_DB_PATH").unwrap_or(defaults.db_path);
    let debug = var("DEBUG").is_some();

    // Location source settings
    let location_source = match var("WHEREAMI_LOCATION_SOURCE") {
        Some(v) => v.parse()?,
        None => defaults.location_source,
    };

    let fixed_latitude = parse_number(
        "WHEREAMI_FIXED_LATITUDE",
        var("WHEREAMI_FIXED_LATITUDE"),
        defaults.fixed_latitude,
    )?;
    let fixed_longitude = parse_number(
        "WHEREAMI_FIXED_LONGITUDE",
        var("WHEREAMI_FIXED_LONGITUDE"),
        defaults.fixed_longitude,
    )?;

    let gpsd_addr = var("WHEREAMI_GPSD_ADDR").unwrap_or(defaults.gpsd_addr);

    let last_location_max_age_secs = parse_number(
        "WHEREAMI_LAST_LOCATION_MAX_AGE_SECS",
        var("WHEREAMI_LAST_LOCATION_MAX_AGE_SECS"),
        defaults.last_location_max_age_secs,
    )?;

    // Reverse geocoder settings
    let geocoder_url = var("WHEREAMI_GEOCODER_URL").unwrap_or(defaults.geocoder_url);
    let geocoder_user_agent =
        var("WHEREAMI_GEOCODER_USER_AGENT").unwrap_or(defaults.geocoder_user_agent);

    let permission_granted = parse_flag(
        var("WHEREAMI_PERMISSION_GRANTED"),
        defaults.permission_granted,
    );

    let fallback = defaults.strings;
    let strings = Strings {
        no_location: var("WHEREAMI_STRING_NO_LOCATION").unwrap_or(fallback.no_location),
        location_error: var("WHEREAMI_STRING_LOCATION_ERROR").unwrap_or(fallback.location_error),
        address_as_of_time_ago: var("WHEREAMI_STRING_ADDRESS_AS_OF_TIME_AGO")
            .unwrap_or(fallback.address_as_of_time_ago),
        address_as_of_time_activity: var("WHEREAMI_STRING_ADDRESS_AS_OF_TIME_ACTIVITY")
            .unwrap_or(fallback.address_as_of_time_activity),
    };

    Ok(Config {
        mode,
        listen_addr,
        db_path,
        debug,
        location_source,
        fixed_latitude,
        fixed_longitude,
        gpsd_addr,
        last_location_max_age_secs,
        geocoder_url,
        geocoder_user_agent,
        permission_granted,
        strings,
    })
}
