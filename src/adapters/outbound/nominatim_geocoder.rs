//! Nominatim Reverse Geocoder
//!
//! Implements Geocoder against the OpenStreetMap Nominatim HTTP API
//! (`/reverse?format=jsonv2`).

use crate::domain::entities::{Address, Location};
use crate::domain::ports::Geocoder;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Default public endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    error: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    pedestrian: Option<String>,
    footway: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    fn into_address(self) -> Address {
        Address {
            country_name: self.country,
            thoroughfare: self.road.or(self.pedestrian).or(self.footway),
            sub_thoroughfare: self.house_number,
        }
    }
}

/// Reverse geocoder backed by a Nominatim server.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Nominatim's usage policy requires an identifying user agent.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, location: &Location) -> anyhow::Result<Option<Address>> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("reverse geocoding failed: {} - {}", status, body);
        }

        let data: ReverseResponse = response.json().await?;
        if let Some(error) = data.error {
            tracing::debug!(
                "nominatim has no address for {},{}: {}",
                location.latitude,
                location.longitude,
                error
            );
            return Ok(None);
        }

        Ok(data.address.map(NominatimAddress::into_address))
    }
}
