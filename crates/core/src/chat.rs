use crate::models::{ChatMessage, ChatRole};

/// Message history of one interactive chat session.
///
/// History only grows by whole user/assistant turns. With a cap set, the
/// oldest turn is dropped once a new one would exceed it.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    max_messages: Option<usize>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps below one turn are raised to one turn.
    pub fn with_limit(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: Some(max_messages.max(2)),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if let Some(limit) = self.max_messages {
            while self.messages.len() + 2 > limit && !self.messages.is_empty() {
                let drop = self.messages.len().min(2);
                self.messages.drain(..drop);
            }
        }

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: user.into(),
        });
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: assistant.into(),
        });
    }
}
