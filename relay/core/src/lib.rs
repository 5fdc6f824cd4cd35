//! Relay Core - Sentence-Aware Chunking of Streamed Completions
//!
//! This crate turns a token-by-token completion stream into bounded,
//! display-ready chunks for chat relays. Chunks arrive progressively, are
//! never larger than a configured size, and prefer to break after sentence
//! punctuation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Caller                                 │
//! │      chat_completion_task(backend, request, settings)             │
//! │                 │                          ▲                      │
//! └─────────────────┼──────────────────────────┼──────────────────────┘
//!                   │ spawn                    │ ChunkEvent
//! ┌─────────────────┼──────────────────────────┼──────────────────────┐
//! │                 ▼        worker task       │                      │
//! │  ┌────────────────────┐  ┌─────────────┐  ┌┴─────────────┐        │
//! │  │ CompletionBackend  │─▶│StreamConsumer│─▶│ ChunkSender  │        │
//! │  │ (OpenAI SSE)       │  │ + Deadline   │  │ (rendezvous) │        │
//! │  └────────────────────┘  └──────┬──────┘  └──────────────┘        │
//! │                                 │                                 │
//! │                          ┌──────┴──────┐                          │
//! │                          │ ChunkBuffer │                          │
//! │                          └─────────────┘                          │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChunkBuffer`]: flush policy over accumulated text (pure logic)
//! - [`StreamConsumer`]: the single-writer loop feeding one buffer
//! - [`ChunkReceiver`] / [`ChunkEvent`]: what the caller reads
//! - [`Deadline`]: wall-clock budget for one stream
//! - [`CompletionBackend`]: upstream provider abstraction
//!
//! # Module Overview
//!
//! - [`access`]: privileged identifier checks
//! - [`backend`]: LLM provider abstraction (OpenAI-compatible)
//! - [`chunk`]: the chunking buffer and boundary recognizer
//! - [`completion`]: per-request worker task
//! - [`config`]: TOML, environment, and CLI configuration
//! - [`session`]: conversation history and request construction
//! - [`streaming`]: consumer loop, output channel, deadline
//! - [`wrap`]: greedy word wrap for display lines

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod access;
pub mod backend;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod session;
pub mod streaming;
pub mod wrap;

// Re-exports for convenience
pub use access::AdminList;
pub use backend::{
    ChatMessage, CompletionBackend, CompletionRequest, CompletionStream, Delta, OpenAiBackend,
    Role, StreamError,
};
pub use chunk::{Boundary, Chunk, ChunkBuffer, FlushReason};
pub use completion::{chat_completion_task, run_completion, StreamSettings};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, RelayConfig, RelayToml,
};
pub use session::{Session, SessionStats};
pub use streaming::{
    chunk_channel, ChunkEvent, ChunkReceiver, ChunkSender, ConsumerReport, ConsumerStats,
    Deadline, Outcome, StreamConsumer,
};
pub use wrap::split_response;
