// Geolocation + reverse geocoding clients
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const IP_GEOLOCATION_URL: &str = "https://ipapi.co/json/";
pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Geolocation request failed: {0}")]
    RequestFailed(String),

    #[error("No country found for {lat},{lon}")]
    NoCountry { lat: f64, lon: f64 },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeoError>;

/// A position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// Looks up where we are and which country that is
///
/// A terminal has no GPS, so the "current fix" is whatever the IP
/// geolocation service reports. Reverse lookup goes through Nominatim,
/// which insists on a real User-Agent.
pub struct GeoClient {
    client: reqwest::Client,
    geolocation_url: String,
    geocoder_url: String,
    timeout: Option<Duration>,
}

impl GeoClient {
    pub fn new() -> Result<Self> {
        Self::with_urls(
            IP_GEOLOCATION_URL.to_string(),
            NOMINATIM_REVERSE_URL.to_string(),
        )
    }

    pub fn with_urls(geolocation_url: String, geocoder_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Headliner/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            geolocation_url,
            geocoder_url,
            timeout: None,
        })
    }

    /// Bound each lookup; a timed-out request fails like any network error
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Current position as reported by the geolocation endpoint
    pub async fn current_fix(&self) -> Result<GeoFix> {
        let body = self.get_text(&self.geolocation_url).await?;
        let fix = parse_fix(&body)?;
        debug!(latitude = fix.latitude, longitude = fix.longitude, "Got location fix");
        Ok(fix)
    }

    /// ISO country code (as the geocoder spells it) for a position
    pub async fn reverse_country(&self, fix: GeoFix) -> Result<String> {
        let url = format!(
            "{}?format=jsonv2&zoom=3&lat={}&lon={}",
            self.geocoder_url, fix.latitude, fix.longitude
        );
        let body = self.get_text(&url).await?;
        parse_country(&body, fix)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeoError::RequestFailed(format!(
                "Status {}: {}",
                status, body
            )));
        }

        Ok(response.text().await?)
    }
}

fn parse_fix(body: &str) -> Result<GeoFix> {
    Ok(serde_json::from_str(body)?)
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    #[serde(default)]
    country_code: Option<String>,
}

fn parse_country(body: &str, fix: GeoFix) -> Result<String> {
    let response: ReverseResponse = serde_json::from_str(body)?;
    response
        .address
        .and_then(|address| address.country_code)
        .filter(|code| !code.trim().is_empty())
        .ok_or(GeoError::NoCountry {
            lat: fix.latitude,
            lon: fix.longitude,
        })
}
