//! The tool-dispatch dialogue loop.
//!
//! A turn moves through [`TurnState`]: the user text is sent to the model,
//! any tool calls it requests are run through the [`ToolRegistry`] and their
//! text fed back, until the model answers in prose. The number of tool
//! executions per turn is capped.

use std::{fmt, sync::Arc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{DialogueError, ModelError},
    geocode::OpenMeteoGeocoder,
    llm::{ChatModel, ChatRequest, GeminiModel, Message, ModelReply, ToolResponse},
    model::ConversationTurn,
    prompt,
    provider::OpenMeteoProvider,
    session::{DialogueSession, SessionStore},
    tools::ToolRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingModelResponse,
    ToolCallRequested,
    ToolExecuting,
    Responded,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingModelResponse => "awaiting-model-response",
            TurnState::ToolCallRequested => "tool-call-requested",
            TurnState::ToolExecuting => "tool-executing",
            TurnState::Responded => "responded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    max_tool_calls: usize,
}

impl Orchestrator {
    /// `max_tool_calls` is raised to 1 if given as 0.
    pub fn new(model: Arc<dyn ChatModel>, registry: ToolRegistry, max_tool_calls: usize) -> Self {
        Self { model, registry, max_tool_calls: max_tool_calls.max(1) }
    }

    /// Wire up Gemini and Open-Meteo from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model = GeminiModel::new(&config.model)?;
        let geocoder = OpenMeteoGeocoder::new(config.geocoding.clone())?;
        let provider = OpenMeteoProvider::new(config.weather.clone())?;

        let registry =
            ToolRegistry::new(config.model.tool_set, Arc::new(geocoder), Arc::new(provider));

        Ok(Self::new(Arc::new(model), registry, config.model.max_tool_calls_per_turn))
    }

    pub fn max_tool_calls(&self) -> usize {
        self.max_tool_calls
    }

    /// A fresh session bound to the system instruction for this tool set.
    pub fn start_session(&self) -> DialogueSession {
        let tool_set = self.registry.tool_set();
        DialogueSession::new(prompt::system_instruction(tool_set), tool_set)
    }

    pub fn open_session(&self, store: &mut SessionStore) -> Uuid {
        let tool_set = self.registry.tool_set();
        store.create(prompt::system_instruction(tool_set), tool_set)
    }

    pub async fn send_to(
        &self,
        store: &mut SessionStore,
        id: Uuid,
        text: &str,
    ) -> Result<String, DialogueError> {
        let session = store.get_mut(id).ok_or(DialogueError::SessionNotFound(id))?;
        self.send(session, text).await
    }

    /// Process one user utterance and return the model's final text.
    ///
    /// The user turn is always recorded. On failure no assistant turn is
    /// recorded and the model context is restored to its pre-turn state.
    #[instrument(skip(self, session, text), fields(session_id = %session.id()))]
    pub async fn send(
        &self,
        session: &mut DialogueSession,
        text: &str,
    ) -> Result<String, DialogueError> {
        session.record_turn(ConversationTurn::user(text));

        let checkpoint = session.context().len();
        session.push_context(Message::User(text.to_string()));

        match self.run_turn(session).await {
            Ok(answer) => {
                session.push_context(Message::Model(ModelReply::Text(answer.clone())));
                session.record_turn(ConversationTurn::assistant(answer.clone()));
                transition(TurnState::Responded, TurnState::Idle);
                Ok(answer)
            }
            Err(err) => {
                warn!("Turn aborted: {err}");
                session.rollback_context(checkpoint);
                Err(err)
            }
        }
    }

    async fn run_turn(&self, session: &mut DialogueSession) -> Result<String, DialogueError> {
        // The session's own tool set decides what is declared and what may run.
        let registry = self.registry.with_tool_set(session.tool_set());
        let declarations = registry.declarations();
        let mut executed = 0usize;
        let mut state = TurnState::Idle;

        loop {
            state = transition(state, TurnState::AwaitingModelResponse);

            let reply = self
                .model
                .generate(ChatRequest {
                    system_instruction: session.system_instruction(),
                    tools: &declarations,
                    messages: session.context(),
                })
                .await?;

            let calls = match reply {
                ModelReply::Text(text) => {
                    transition(state, TurnState::Responded);
                    return Ok(text);
                }
                ModelReply::ToolCalls(calls) if calls.is_empty() => {
                    return Err(ModelError::EmptyResponse.into());
                }
                ModelReply::ToolCalls(calls) => calls,
            };

            state = transition(state, TurnState::ToolCallRequested);

            if executed + calls.len() > self.max_tool_calls {
                return Err(DialogueError::ToolCallLimitExceeded { limit: self.max_tool_calls });
            }

            state = transition(state, TurnState::ToolExecuting);

            let mut responses = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = registry.dispatch(&call.name, &call.args).await?;
                executed += 1;
                responses.push(ToolResponse { name: call.name.clone(), output: result.text });
            }

            info!(executed, "Feeding tool results back to the model");
            session.push_context(Message::Model(ModelReply::ToolCalls(calls)));
            session.push_context(Message::ToolResults(responses));
        }
    }
}

fn transition(from: TurnState, to: TurnState) -> TurnState {
    debug!(%from, %to, "Turn state");
    to
}
