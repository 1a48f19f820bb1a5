use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to Open-Meteo (geocoding or forecast).
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not parse response: {0}")]
    Parse(String),

    #[error("incomplete data: {0}")]
    Incomplete(String),
}

/// Failure of a single tool invocation. Rendered into the tool result text,
/// never propagated to the dialogue loop.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Error: could not find the location of city '{city}'.")]
    LocationNotFound { city: String },

    #[error("Error: invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Error connecting to the weather service: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Failure talking to the language model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no language model API key configured")]
    MissingCredential,

    #[error("language model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("language model returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not parse language model response: {0}")]
    Parse(String),

    #[error("language model returned no usable content")]
    EmptyResponse,
}

/// Failure that aborts a dialogue turn.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model requested unknown tool '{0}'")]
    UnknownTool(String),

    #[error("model exceeded {limit} tool calls in a single turn")]
    ToolCallLimitExceeded { limit: usize },

    #[error("no dialogue session with id {0}")]
    SessionNotFound(uuid::Uuid),
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
