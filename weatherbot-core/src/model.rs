use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::condition::WeatherCondition;

/// Placeholder rendered for a measurement the weather service did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// A geocoded position. Only ever produced by the geocoder and consumed within
/// the same tool invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A numeric measurement that may be absent from the upstream payload.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading(pub Option<f64>);

impl Reading {
    pub fn value(&self) -> Option<f64> {
        self.0
    }
}

impl From<Option<f64>> for Reading {
    fn from(value: Option<f64>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub condition: WeatherCondition,
    pub temperature_c: Reading,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub condition: WeatherCondition,
    pub temp_max_c: Reading,
    pub temp_min_c: Reading,
    pub precipitation_mm: Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the visible chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}
