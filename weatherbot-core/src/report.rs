//! Flattening of weather data into the plain-text reports handed to the model.

use crate::model::{CurrentConditions, ForecastDay};

pub fn render_current(current: &CurrentConditions) -> String {
    format!(
        "Current conditions: {} | Temperature: {}°C",
        current.condition, current.temperature_c
    )
}

/// One line per day, in the order given.
pub fn render_forecast(days: &[ForecastDay]) -> String {
    days.iter()
        .map(|day| {
            format!(
                "Date: {} | Condition: {} | Max: {}°C | Min: {}°C | Precipitation: {}mm",
                day.date.format("%Y-%m-%d"),
                day.condition,
                day.temp_max_c,
                day.temp_min_c,
                day.precipitation_mm,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
