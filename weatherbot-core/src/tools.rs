//! Weather operations exposed to the language model as callable tools.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{convert::TryFrom, fmt, sync::Arc};
use tracing::{info, instrument, warn};

use crate::{
    error::{DialogueError, ToolError},
    geocode::Geocoder,
    provider::WeatherProvider,
    report,
};

/// Name of the single parameter every tool takes.
pub const CITY_PARAM: &str = "city_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CurrentWeather,
    WeatherForecast,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::CurrentWeather => "get_current_weather",
            ToolKind::WeatherForecast => "get_weather_forecast",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::CurrentWeather => {
                "Get the weather conditions right now for a city. Use this only when the user \
                 explicitly asks about the CURRENT weather, the weather NOW or in REAL TIME."
            }
            ToolKind::WeatherForecast => {
                "Get the 4-day weather forecast (condition, max/min temperature, precipitation) \
                 for a city. Use this when the user asks for a FORECAST, about TOMORROW or the \
                 NEXT DAYS."
            }
        }
    }

    pub fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                CITY_PARAM: {
                    "type": "string",
                    "description": "The name of the city, e.g. Tokyo or São Paulo"
                }
            },
            "required": [CITY_PARAM]
        })
    }

    pub fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }

    pub const fn all() -> &'static [ToolKind] {
        &[ToolKind::CurrentWeather, ToolKind::WeatherForecast]
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for ToolKind {
    type Error = DialogueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ToolKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == value)
            .ok_or_else(|| DialogueError::UnknownTool(value.to_string()))
    }
}

/// Which tools are declared to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolSet {
    #[default]
    CurrentAndForecast,
    /// Removes the current/forecast ambiguity at the cost of current conditions.
    ForecastOnly,
}

impl ToolSet {
    pub fn tools(&self) -> &'static [ToolKind] {
        match self {
            ToolSet::CurrentAndForecast => ToolKind::all(),
            ToolSet::ForecastOnly => &[ToolKind::WeatherForecast],
        }
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.tools().contains(&kind)
    }
}

/// A tool as declared to the language model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Outcome of a tool invocation. Only `text` reaches the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub was_error: bool,
}

impl ToolResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self { text: text.into(), was_error: false }
    }

    pub fn from_error(err: &ToolError) -> Self {
        Self { text: err.to_string(), was_error: true }
    }
}

/// Binds declared tools to the geocoder and weather provider.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tool_set: ToolSet,
    geocoder: Arc<dyn Geocoder>,
    provider: Arc<dyn WeatherProvider>,
}

impl ToolRegistry {
    pub fn new(
        tool_set: ToolSet,
        geocoder: Arc<dyn Geocoder>,
        provider: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self { tool_set, geocoder, provider }
    }

    pub fn tool_set(&self) -> ToolSet {
        self.tool_set
    }

    /// The same bindings serving a different set of tools.
    pub fn with_tool_set(&self, tool_set: ToolSet) -> Self {
        Self { tool_set, ..self.clone() }
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tool_set.tools().iter().map(ToolKind::declaration).collect()
    }

    /// Resolve `name` to a tool registered in this set.
    pub fn lookup(&self, name: &str) -> Result<ToolKind, DialogueError> {
        let kind = ToolKind::try_from(name)?;
        if !self.tool_set.contains(kind) {
            return Err(DialogueError::UnknownTool(name.to_string()));
        }
        Ok(kind)
    }

    /// Run the named tool. Lookup failures are errors; everything that goes
    /// wrong inside the tool is folded into the returned text.
    #[instrument(skip(self, args))]
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<ToolResult, DialogueError> {
        let kind = self.lookup(name)?;

        let result = match self.run(kind, args).await {
            Ok(text) => ToolResult::ok(text),
            Err(err) => {
                warn!(tool = %kind, "Tool failed: {err}");
                ToolResult::from_error(&err)
            }
        };

        info!(tool = %kind, was_error = result.was_error, "Tool finished");
        Ok(result)
    }

    async fn run(&self, kind: ToolKind, args: &Value) -> Result<String, ToolError> {
        let city = city_argument(args)?;

        let coords = self
            .geocoder
            .resolve(city)
            .await
            .ok_or_else(|| ToolError::LocationNotFound { city: city.to_string() })?;

        match kind {
            ToolKind::CurrentWeather => {
                let current = self.provider.fetch_current(coords).await?;
                Ok(report::render_current(&current))
            }
            ToolKind::WeatherForecast => {
                let days = self.provider.fetch_forecast(coords).await?;
                Ok(report::render_forecast(&days))
            }
        }
    }
}

fn city_argument(args: &Value) -> Result<&str, ToolError> {
    args.get(CITY_PARAM)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .ok_or_else(|| {
            ToolError::InvalidArguments(format!("missing required string argument '{CITY_PARAM}'"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingProvider, FixedGeocoder, TOKYO};
    use crate::{model::Coordinates, provider::FORECAST_DAYS};

    fn registry(
        tool_set: ToolSet,
        coords: Option<Coordinates>,
        provider: Arc<CountingProvider>,
    ) -> ToolRegistry {
        ToolRegistry::new(tool_set, Arc::new(FixedGeocoder(coords)), provider)
    }

    #[test]
    fn tool_names_roundtrip() {
        for kind in ToolKind::all() {
            let parsed = ToolKind::try_from(kind.name()).expect("roundtrip should succeed");
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn unknown_tool_name_is_an_error() {
        let err = ToolKind::try_from("launch_rockets").unwrap_err();
        assert!(matches!(err, DialogueError::UnknownTool(name) if name == "launch_rockets"));
    }

    #[test]
    fn declarations_follow_tool_set() {
        let provider = Arc::new(CountingProvider::default());

        let both = registry(ToolSet::CurrentAndForecast, None, provider.clone()).declarations();
        let names: Vec<_> = both.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["get_current_weather", "get_weather_forecast"]);

        let forecast_only = registry(ToolSet::ForecastOnly, None, provider).declarations();
        assert_eq!(forecast_only.len(), 1);
        assert_eq!(forecast_only[0].name, "get_weather_forecast");
    }

    #[test]
    fn declarations_require_city_name() {
        let decl = ToolKind::CurrentWeather.declaration();
        assert_eq!(decl.parameters["required"], serde_json::json!(["city_name"]));
        assert_eq!(decl.parameters["properties"]["city_name"]["type"], "string");
    }

    #[tokio::test]
    async fn current_weather_reports_condition_and_temperature() {
        let provider = Arc::new(CountingProvider::default());
        let reg = registry(ToolSet::CurrentAndForecast, Some(TOKYO), provider.clone());

        let result = reg
            .dispatch("get_current_weather", &serde_json::json!({ "city_name": "Tokyo" }))
            .await
            .expect("tool is registered");

        assert!(!result.was_error);
        assert_eq!(result.text, "Current conditions: Mainly clear 🌤️ | Temperature: 22°C");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn forecast_reports_four_lines() {
        let provider = Arc::new(CountingProvider::default());
        let reg = registry(ToolSet::ForecastOnly, Some(TOKYO), provider);

        let result = reg
            .dispatch("get_weather_forecast", &serde_json::json!({ "city_name": "Tokyo" }))
            .await
            .expect("tool is registered");

        assert_eq!(result.text.lines().count(), FORECAST_DAYS);
    }

    #[tokio::test]
    async fn unmatched_city_skips_weather_service() {
        for tool in ["get_current_weather", "get_weather_forecast"] {
            let provider = Arc::new(CountingProvider::default());
            let reg = registry(ToolSet::CurrentAndForecast, None, provider.clone());

            let result = reg
                .dispatch(tool, &serde_json::json!({ "city_name": "Atlantis" }))
                .await
                .expect("tool is registered");

            assert!(result.was_error);
            assert_eq!(result.text, "Error: could not find the location of city 'Atlantis'.");
            assert_eq!(provider.calls(), 0);
        }
    }

    #[tokio::test]
    async fn upstream_failure_becomes_error_text() {
        let provider = Arc::new(CountingProvider { fail: true, ..Default::default() });
        let reg = registry(ToolSet::CurrentAndForecast, Some(TOKYO), provider);

        let result = reg
            .dispatch("get_current_weather", &serde_json::json!({ "city_name": "Tokyo" }))
            .await
            .expect("tool is registered");

        assert!(result.was_error);
        assert!(result.text.starts_with("Error connecting to the weather service"));
    }

    #[tokio::test]
    async fn missing_city_argument_becomes_error_text() {
        let provider = Arc::new(CountingProvider::default());
        let reg = registry(ToolSet::CurrentAndForecast, Some(TOKYO), provider.clone());

        let result = reg
            .dispatch("get_current_weather", &serde_json::json!({ "city": "Tokyo" }))
            .await
            .expect("tool is registered");

        assert!(result.was_error);
        assert!(result.text.contains("city_name"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn narrowed_registry_rejects_current_weather() {
        let provider = Arc::new(CountingProvider::default());
        let reg = registry(ToolSet::CurrentAndForecast, Some(TOKYO), provider.clone())
            .with_tool_set(ToolSet::ForecastOnly);

        assert_eq!(reg.declarations().len(), 1);
        let err = reg
            .dispatch("get_current_weather", &serde_json::json!({ "city_name": "Tokyo" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DialogueError::UnknownTool(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn undeclared_tool_is_rejected() {
        let provider = Arc::new(CountingProvider::default());
        let reg = registry(ToolSet::ForecastOnly, Some(TOKYO), provider.clone());

        let err = reg
            .dispatch("get_current_weather", &serde_json::json!({ "city_name": "Tokyo" }))
            .await
            .unwrap_err();

        assert!(matches!(err, DialogueError::UnknownTool(_)));
        assert_eq!(provider.calls(), 0);
    }
}
