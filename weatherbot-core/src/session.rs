//! Dialogue sessions and their explicit lifecycle.

use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    llm::Message,
    model::ConversationTurn,
    tools::ToolSet,
};

/// State of one conversation: the fixed system instruction, the model-side
/// context and the visible transcript.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    id: Uuid,
    system_instruction: String,
    tool_set: ToolSet,
    context: Vec<Message>,
    history: Vec<ConversationTurn>,
}

impl DialogueSession {
    pub fn new(system_instruction: impl Into<String>, tool_set: ToolSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            system_instruction: system_instruction.into(),
            tool_set,
            context: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn tool_set(&self) -> ToolSet {
        self.tool_set
    }

    /// The visible transcript, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn context(&self) -> &[Message] {
        &self.context
    }

    pub(crate) fn record_turn(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
    }

    pub(crate) fn push_context(&mut self, message: Message) {
        self.context.push(message);
    }

    /// Drop context entries added after `len`. The transcript is untouched.
    pub(crate) fn rollback_context(&mut self, len: usize) {
        self.context.truncate(len);
    }
}

/// Owner of every live session, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, DialogueSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, system_instruction: impl Into<String>, tool_set: ToolSet) -> Uuid {
        let session = DialogueSession::new(system_instruction, tool_set);
        let id = session.id();
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&DialogueSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut DialogueSession> {
        self.sessions.get_mut(&id)
    }

    pub fn destroy(&mut self, id: Uuid) -> Option<DialogueSession> {
        self.sessions.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
