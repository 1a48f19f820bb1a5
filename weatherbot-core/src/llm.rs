//! Provider-neutral view of a function-calling language model.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{error::ModelError, tools::ToolDeclaration};

pub mod gemini;

pub use gemini::GeminiModel;

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
    /// Opaque provider token that must be replayed with the call.
    pub signature: Option<String>,
}

/// The text a tool produced for a [`ToolCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub name: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

/// One entry of the model-side conversation context.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    User(String),
    Model(ModelReply),
    ToolResults(Vec<ToolResponse>),
}

#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system_instruction: &'a str,
    pub tools: &'a [ToolDeclaration],
    pub messages: &'a [Message],
}

#[async_trait]
pub trait ChatModel: Send + Sync + Debug {
    async fn generate(&self, request: ChatRequest<'_>) -> Result<ModelReply, ModelError>;
}
