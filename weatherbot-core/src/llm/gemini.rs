//! Google Gemini `generateContent` client.
//!
//! Wire format: <https://ai.google.dev/api/generate-content>.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::ModelConfig,
    error::{ModelError, truncate_body},
    tools::ToolDeclaration,
};

use super::{ChatModel, ChatRequest, Message, ModelReply, ToolCall};

#[derive(Debug, Clone)]
pub struct GeminiModel {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl GeminiModel {
    /// Fails with [`ModelError::MissingCredential`] when the key is blank.
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ModelError::MissingCredential)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: config.name.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    #[instrument(skip_all, fields(model = %self.model, messages = request.messages.len()))]
    async fn generate(&self, request: ChatRequest<'_>) -> Result<ModelReply, ModelError> {
        let body = GenerateContentRequest::from_chat(&request);

        let res = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(ModelError::Status { status, body: truncate_body(&text) });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::Parse(e.to_string()))?;

        let reply = parsed.into_reply()?;
        debug!(?reply, "Model replied");
        Ok(reply)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolBlock<'a> {
    function_declarations: &'a [ToolDeclaration],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    FunctionCall {
        function_call: FunctionCallBody<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought_signature: Option<&'a str>,
    },
    #[serde(rename_all = "camelCase")]
    FunctionResponse {
        function_response: FunctionResponseBody<'a>,
    },
}

#[derive(Debug, Serialize)]
struct FunctionCallBody<'a> {
    name: &'a str,
    args: &'a Value,
}

#[derive(Debug, Serialize)]
struct FunctionResponseBody<'a> {
    name: &'a str,
    response: FunctionResponseContent<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionResponseContent<'a> {
    content: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_chat(request: &ChatRequest<'a>) -> Self {
        let contents = request.messages.iter().map(Content::from_message).collect();

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![ToolBlock { function_declarations: request.tools }]
        };

        Self {
            system_instruction: SystemInstruction {
                parts: [TextPart { text: request.system_instruction }],
            },
            contents,
            tools,
        }
    }
}

impl<'a> Content<'a> {
    fn from_message(message: &'a Message) -> Self {
        match message {
            Message::User(text) => Content {
                role: "user",
                parts: vec![RequestPart::Text { text }],
            },
            Message::Model(ModelReply::Text(text)) => Content {
                role: "model",
                parts: vec![RequestPart::Text { text }],
            },
            Message::Model(ModelReply::ToolCalls(calls)) => Content {
                role: "model",
                parts: calls
                    .iter()
                    .map(|call| RequestPart::FunctionCall {
                        function_call: FunctionCallBody { name: &call.name, args: &call.args },
                        thought_signature: call.signature.as_deref(),
                    })
                    .collect(),
            },
            Message::ToolResults(results) => Content {
                role: "function",
                parts: results
                    .iter()
                    .map(|r| RequestPart::FunctionResponse {
                        function_response: FunctionResponseBody {
                            name: &r.name,
                            response: FunctionResponseContent { content: &r.output },
                        },
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// Parts may carry text, a function call, or both alongside a signature.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    function_call: Option<ResponseFunctionCall>,
    thought_signature: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ResponseFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

impl GenerateContentResponse {
    /// Function calls win over text; thought parts are dropped.
    fn into_reply(self) -> Result<ModelReply, ModelError> {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .ok_or(ModelError::EmptyResponse)?;

        let mut calls = Vec::new();
        let mut text = String::new();

        for part in parts {
            if let Some(call) = part.function_call {
                calls.push(ToolCall {
                    name: call.name,
                    args: call.args,
                    signature: part.thought_signature,
                });
            } else if let Some(t) = part.text.filter(|_| !part.thought) {
                text.push_str(&t);
            }
        }

        if !calls.is_empty() {
            Ok(ModelReply::ToolCalls(calls))
        } else if !text.trim().is_empty() {
            Ok(ModelReply::Text(text))
        } else {
            Err(ModelError::EmptyResponse)
        }
    }
}
