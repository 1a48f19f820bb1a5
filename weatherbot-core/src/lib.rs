//! Core library for the `weatherbot` chat assistant.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding and weather lookups against Open-Meteo
//! - The weather tools exposed to a function-calling language model
//! - Dialogue sessions and the tool-dispatch loop that drives them
//!
//! It is used by `weatherbot-cli`, but can also be reused by other front-ends.

pub mod condition;
pub mod config;
pub mod error;
pub mod geocode;
pub mod llm;
pub mod model;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod report;
pub mod session;
pub mod tools;

#[cfg(test)]
mod testing;

pub use condition::WeatherCondition;
pub use config::Config;
pub use error::{DialogueError, ModelError, ToolError, UpstreamError};
pub use geocode::{Geocoder, OpenMeteoGeocoder};
pub use llm::{ChatModel, GeminiModel, ModelReply};
pub use model::{ConversationTurn, Coordinates, CurrentConditions, ForecastDay, Role};
pub use orchestrator::{Orchestrator, TurnState};
pub use provider::{FORECAST_DAYS, OpenMeteoProvider, WeatherProvider};
pub use session::{DialogueSession, SessionStore};
pub use tools::{ToolKind, ToolRegistry, ToolResult, ToolSet};
