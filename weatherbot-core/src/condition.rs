//! WMO weather interpretation codes.
//!
//! See <https://open-meteo.com/en/docs#weathervariables>.

use std::fmt;

/// Label used for any code missing from [`WMO_CODES`] and for absent codes.
pub const UNKNOWN_CONDITION: &str = "Unknown condition";

const WMO_CODES: &[(i32, &str)] = &[
    (0, "Clear sky ☀️"),
    (1, "Mainly clear 🌤️"),
    (2, "Partly cloudy ⛅"),
    (3, "Overcast ☁️"),
    (45, "Fog 🌫️"),
    (48, "Depositing rime fog ❄️"),
    (51, "Light drizzle 🌧️"),
    (53, "Moderate drizzle 🌧️"),
    (55, "Dense drizzle 🌧️"),
    (56, "Light freezing drizzle 🌧️"),
    (57, "Dense freezing drizzle 🌧️"),
    (61, "Slight rain ☔"),
    (63, "Moderate rain ☔"),
    (65, "Heavy rain ⛈️"),
    (66, "Light freezing rain 🌧️"),
    (67, "Heavy freezing rain 🌧️"),
    (71, "Slight snowfall 🌨️"),
    (73, "Moderate snowfall 🌨️"),
    (75, "Heavy snowfall ❄️"),
    (77, "Snow grains 🌨️"),
    (80, "Slight rain showers 🌦️"),
    (81, "Moderate rain showers 🌦️"),
    (82, "Violent rain showers ⛈️"),
    (85, "Slight snow showers 🌨️"),
    (86, "Heavy snow showers 🌨️"),
    (95, "Thunderstorm ⚡"),
    (96, "Thunderstorm with slight hail 🌨️"),
    (99, "Thunderstorm with heavy hail 🌨️"),
];

/// A decoded weather code. The code itself may be missing from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeatherCondition(Option<i32>);

impl WeatherCondition {
    pub fn from_code(code: i32) -> Self {
        Self(Some(code))
    }

    pub fn code(&self) -> Option<i32> {
        self.0
    }

    /// Human-readable label; never fails.
    pub fn label(&self) -> &'static str {
        self.0
            .and_then(|code| {
                WMO_CODES
                    .iter()
                    .find(|(known, _)| *known == code)
                    .map(|(_, label)| *label)
            })
            .unwrap_or(UNKNOWN_CONDITION)
    }

    pub fn is_known(&self) -> bool {
        self.label() != UNKNOWN_CONDITION
    }
}

impl From<Option<i32>> for WeatherCondition {
    fn from(value: Option<i32>) -> Self {
        Self(value)
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
