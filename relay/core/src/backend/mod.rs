//! LLM Backend Integration
//!
//! Upstream completion providers behind a common trait, so the streaming
//! worker never sees provider wire formats.
//!
//! # Available Backends
//!
//! - **OpenAI-compatible**: any server speaking the `/chat/completions`
//!   server-sent-events protocol
//!
//! # Usage
//!
//! ```ignore
//! use relay_core::backend::{CompletionBackend, CompletionRequest, OpenAiBackend};
//!
//! let backend = OpenAiBackend::new("https://api.openai.com/v1", Some(key));
//! let request = CompletionRequest::new("gpt-4o-mini").with_max_tokens(256);
//! let mut stream = backend.open_stream(&request).await?;
//! while let Some(delta) = stream.recv().await? {
//!     print!("{}", delta.content);
//! }
//! ```

mod error;
mod openai;
mod traits;

pub use error::StreamError;
pub use openai::{parse_event_line, EventLine, OpenAiBackend, OpenAiStream};
pub use traits::{ChatMessage, CompletionBackend, CompletionRequest, CompletionStream, Delta, Role};
