use crate::{
    error::UpstreamError,
    model::{Coordinates, CurrentConditions, ForecastDay},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openmeteo;

pub use openmeteo::OpenMeteoProvider;

/// Forecast horizon, in days, for every forecast request.
pub const FORECAST_DAYS: usize = 4;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, coords: Coordinates) -> Result<CurrentConditions, UpstreamError>;

    /// Exactly [`FORECAST_DAYS`] entries in chronological order.
    async fn fetch_forecast(&self, coords: Coordinates) -> Result<Vec<ForecastDay>, UpstreamError>;
}
