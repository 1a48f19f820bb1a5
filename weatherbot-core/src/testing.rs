//! In-process doubles for the geocoder, weather provider and language model.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    condition::WeatherCondition,
    error::{ModelError, UpstreamError},
    geocode::Geocoder,
    llm::{ChatModel, ChatRequest, Message, ModelReply},
    model::{Coordinates, CurrentConditions, ForecastDay, Reading},
    provider::{FORECAST_DAYS, WeatherProvider},
};

pub const TOKYO: Coordinates = Coordinates { latitude: 35.68, longitude: 139.69 };

#[derive(Debug)]
pub struct FixedGeocoder(pub Option<Coordinates>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn resolve(&self, _city_name: &str) -> Option<Coordinates> {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct CountingProvider {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for CountingProvider {
    async fn fetch_current(&self, _coords: Coordinates) -> Result<CurrentConditions, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::Parse("bad json".into()));
        }
        Ok(CurrentConditions {
            condition: WeatherCondition::from_code(1),
            temperature_c: Reading(Some(22.0)),
        })
    }

    async fn fetch_forecast(&self, _coords: Coordinates) -> Result<Vec<ForecastDay>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::Parse("bad json".into()));
        }
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        Ok((0..FORECAST_DAYS as i64)
            .map(|i| ForecastDay {
                date: start + Duration::days(i),
                condition: WeatherCondition::from_code(0),
                temp_max_c: Reading(Some(30.0)),
                temp_min_c: Reading(Some(20.0)),
                precipitation_mm: Reading(Some(0.0)),
            })
            .collect())
    }
}

type Script = dyn Fn(&[Message]) -> Result<ModelReply, ModelError> + Send + Sync;

/// A model whose reply is computed from the context it is sent.
pub struct ScriptedModel {
    script: Box<Script>,
    pub requests: Mutex<Vec<Vec<Message>>>,
    /// Tool names declared on each request.
    pub declared: Mutex<Vec<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&[Message]) -> Result<ModelReply, ModelError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
            declared: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }

    pub fn last_declared(&self) -> Option<Vec<String>> {
        self.declared.lock().expect("lock").last().cloned()
    }
}

impl std::fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedModel").finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, request: ChatRequest<'_>) -> Result<ModelReply, ModelError> {
        self.requests.lock().expect("lock").push(request.messages.to_vec());
        self.declared
            .lock()
            .expect("lock")
            .push(request.tools.iter().map(|t| t.name.clone()).collect());
        (self.script)(request.messages)
    }
}
