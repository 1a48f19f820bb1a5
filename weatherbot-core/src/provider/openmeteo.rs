use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    condition::WeatherCondition,
    config::WeatherConfig,
    error::{UpstreamError, truncate_body},
    model::{Coordinates, CurrentConditions, ForecastDay, Reading},
};

use super::{FORECAST_DAYS, WeatherProvider};

const CURRENT_FIELDS: &str = "temperature_2m,weather_code";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,weather_code";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    config: WeatherConfig,
}

impl OpenMeteoProvider {
    pub fn new(config: WeatherConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    async fn get_forecast_endpoint<T: DeserializeOwned>(
        &self,
        coords: Coordinates,
        extra: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/forecast", self.config.base_url.trim_end_matches('/'));

        let mut params = vec![
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("timezone", self.config.timezone.clone()),
        ];
        params.extend(extra.iter().map(|(k, v)| (*k, v.clone())));

        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status { status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body).map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    #[instrument(skip(self), fields(lat = coords.latitude, lon = coords.longitude))]
    async fn fetch_current(&self, coords: Coordinates) -> Result<CurrentConditions, UpstreamError> {
        let parsed: OmCurrentResponse = self
            .get_forecast_endpoint(coords, &[("current", CURRENT_FIELDS.to_string())])
            .await?;

        debug!(current = ?parsed.current, "Fetched current conditions");

        Ok(CurrentConditions {
            condition: parsed.current.weather_code.into(),
            temperature_c: parsed.current.temperature_2m.into(),
        })
    }

    #[instrument(skip(self), fields(lat = coords.latitude, lon = coords.longitude))]
    async fn fetch_forecast(&self, coords: Coordinates) -> Result<Vec<ForecastDay>, UpstreamError> {
        let parsed: OmDailyResponse = self
            .get_forecast_endpoint(
                coords,
                &[
                    ("daily", DAILY_FIELDS.to_string()),
                    ("forecast_days", FORECAST_DAYS.to_string()),
                ],
            )
            .await?;

        let daily = parsed
            .daily
            .ok_or_else(|| UpstreamError::Incomplete("response has no daily data".to_string()))?;

        let days = parse_daily(&daily, FORECAST_DAYS)?;
        debug!(days = days.len(), "Fetched forecast");
        Ok(days)
    }
}

/// Zip the parallel daily arrays into `days` entries. Dates must parse and
/// strictly increase; missing or null measurements become absent readings.
fn parse_daily(daily: &OmDaily, days: usize) -> Result<Vec<ForecastDay>, UpstreamError> {
    if daily.time.len() < days {
        return Err(UpstreamError::Incomplete(format!(
            "expected {days} forecast days, got {}",
            daily.time.len()
        )));
    }

    let mut out: Vec<ForecastDay> = Vec::with_capacity(days);

    for (i, raw_date) in daily.time.iter().take(days).enumerate() {
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| UpstreamError::Parse(format!("invalid date '{raw_date}': {e}")))?;

        if let Some(prev) = out.last() {
            if prev.date >= date {
                return Err(UpstreamError::Incomplete(format!(
                    "forecast dates out of order: {} then {date}",
                    prev.date
                )));
            }
        }

        out.push(ForecastDay {
            date,
            condition: WeatherCondition::from(cell(&daily.weather_code, i)),
            temp_max_c: Reading(cell(&daily.temperature_2m_max, i)),
            temp_min_c: Reading(cell(&daily.temperature_2m_min, i)),
            precipitation_mm: Reading(cell(&daily.precipitation_sum, i)),
        });
    }

    Ok(out)
}

fn cell<T: Copy>(column: &[Option<T>], i: usize) -> Option<T> {
    column.get(i).copied().flatten()
}

#[derive(Debug, Deserialize)]
struct OmCurrentResponse {
    #[serde(default)]
    current: OmCurrent,
}

#[derive(Debug, Default, Deserialize)]
struct OmCurrent {
    temperature_2m: Option<f64>,
    #[serde(alias = "weathercode")]
    weather_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OmDailyResponse {
    daily: Option<OmDaily>,
}

#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default, alias = "weathercode")]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}
