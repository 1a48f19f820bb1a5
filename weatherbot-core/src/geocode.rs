//! Forward geocoding: city name to coordinates via the Open-Meteo geocoding API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::{debug, instrument, warn};

use crate::{
    config::GeocodingConfig,
    error::{UpstreamError, truncate_body},
    model::Coordinates,
};

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Best match for `city_name`, or `None` when nothing matched or the
    /// lookup failed. Failures are not distinguished from empty results.
    async fn resolve(&self, city_name: &str) -> Option<Coordinates>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    config: GeocodingConfig,
}

impl OpenMeteoGeocoder {
    pub fn new(config: GeocodingConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    async fn lookup(&self, city_name: &str) -> Result<Option<Coordinates>, UpstreamError> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .query(&[
                ("name", city_name),
                ("count", "1"),
                ("language", self.config.language.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status { status, body: truncate_body(&body) });
        }

        let parsed: GeoSearchResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Parse(e.to_string()))?;

        Ok(parsed.results.first().map(|r| Coordinates {
            latitude: r.latitude,
            longitude: r.longitude,
        }))
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, city_name: &str) -> Option<Coordinates> {
        match self.lookup(city_name).await {
            Ok(Some(coords)) => {
                debug!(lat = coords.latitude, lon = coords.longitude, "Geocoded city");
                Some(coords)
            }
            Ok(None) => {
                debug!("No geocoding match");
                None
            }
            Err(e) => {
                warn!("Geocoding lookup failed: {e}");
                None
            }
        }
    }
}

/// The API omits `results` entirely when nothing matches.
#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    latitude: f64,
    longitude: f64,
}
