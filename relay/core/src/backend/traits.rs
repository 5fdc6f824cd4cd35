//! Completion Backend Traits
//!
//! A backend opens one upstream stream per request; the stream hands out
//! text deltas until it ends or fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StreamError;

/// Author of a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation
    System,
    /// The human side
    User,
    /// The model side
    Assistant,
}

/// One message of conversation history
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who wrote it
    pub role: Role,
    /// Message text
    pub content: String,
    /// When it was added
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A streaming chat completion request
#[derive(Clone, Debug, Default)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
    /// Generation cap (0 = provider default)
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create an empty request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the message history
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Append a single message
    #[must_use]
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A piece of generated text
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    /// The text (empty for events that carry none)
    pub content: String,
}

impl Delta {
    /// Create a delta
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// An open upstream completion stream
#[async_trait]
pub trait CompletionStream: Send {
    /// Receive the next delta
    ///
    /// `Ok(None)` signals normal end-of-stream.
    async fn recv(&mut self) -> Result<Option<Delta>, StreamError>;

    /// Release the upstream connection
    ///
    /// Must be safe to call more than once.
    fn close(&mut self);
}

/// Completion provider
///
/// Implement this trait to add support for different LLM providers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Backend name (e.g. "OpenAI")
    fn name(&self) -> &str;

    /// Start a streaming completion
    async fn open_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<Box<dyn CompletionStream>, StreamError>;
}
