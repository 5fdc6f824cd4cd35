//! Session Management
//!
//! A session is one ongoing conversation: an optional system prompt plus the
//! user/assistant exchange so far. Each completion request is built from the
//! session's history.

use uuid::Uuid;

use crate::backend::{ChatMessage, CompletionRequest, Role};
use crate::config::RelayConfig;

/// Snapshot of session size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Messages in history, system prompt included
    pub message_count: usize,
    /// Total content bytes across those messages
    pub content_bytes: usize,
}

/// A conversation session
#[derive(Clone, Debug)]
pub struct Session {
    /// Unique session ID
    pub id: Uuid,
    /// Prepended to every request
    system_prompt: Option<String>,
    /// User and assistant messages, oldest first
    messages: Vec<ChatMessage>,
    /// Maximum total content bytes kept in `messages` (0 = unlimited)
    max_content_bytes: usize,
    /// Current total content bytes in `messages`
    current_content_bytes: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Session {
    /// Create a new session
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            system_prompt,
            messages: Vec::new(),
            max_content_bytes: 0,
            current_content_bytes: 0,
        }
    }

    /// Create a session using the configured system prompt and history cap
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.system_prompt.clone()).with_max_content_bytes(config.max_history_bytes)
    }

    /// Limit retained history to `max_content_bytes` (0 = unlimited)
    #[must_use]
    pub fn with_max_content_bytes(mut self, max_content_bytes: usize) -> Self {
        self.max_content_bytes = max_content_bytes;
        self.prune_if_needed();
        self
    }

    /// Add a user message
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    /// The system prompt, if any
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Messages that would be sent, system prompt first
    #[must_use]
    pub fn history(&self) -> Vec<ChatMessage> {
        self.system_prompt
            .iter()
            .map(|prompt| ChatMessage::new(Role::System, prompt.clone()))
            .chain(self.messages.iter().cloned())
            .collect()
    }

    /// Total content bytes of [`history`](Self::history)
    #[must_use]
    pub fn total_content_len(&self) -> usize {
        self.system_prompt.as_ref().map_or(0, String::len) + self.current_content_bytes
    }

    /// Current size, logged at debug level
    pub fn stats(&self) -> SessionStats {
        let stats = SessionStats {
            message_count: self.messages.len() + usize::from(self.system_prompt.is_some()),
            content_bytes: self.total_content_len(),
        };
        tracing::debug!(
            session = %self.id,
            messages = stats.message_count,
            bytes = stats.content_bytes,
            "Session stats"
        );
        stats
    }

    /// Build a completion request from the current history
    #[must_use]
    pub fn request(&self, model: &str, max_tokens: u32) -> CompletionRequest {
        CompletionRequest::new(model)
            .with_messages(self.history())
            .with_max_tokens(max_tokens)
    }

    /// Clear message history (keeps the system prompt)
    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.current_content_bytes = 0;
    }

    fn push(&mut self, message: ChatMessage) {
        self.current_content_bytes += message.content.len();
        self.messages.push(message);
        self.prune_if_needed();
    }

    /// Drop oldest messages while over the byte limit, always keeping the newest
    fn prune_if_needed(&mut self) {
        if self.max_content_bytes == 0 {
            return;
        }
        let mut excess = 0;
        while self.messages.len() - excess > 1 && self.current_content_bytes > self.max_content_bytes
        {
            self.current_content_bytes -= self.messages[excess].content.len();
            excess += 1;
        }
        if excess > 0 {
            self.messages.drain(..excess);
            tracing::debug!(session = %self.id, dropped = excess, "Pruned session history");
        }
    }
}
