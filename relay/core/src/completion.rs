//! Completion Task
//!
//! Entry point that turns one [`CompletionRequest`] into a [`ChunkReceiver`].
//! A dedicated tokio task opens the upstream stream under the session
//! deadline and runs a [`StreamConsumer`] over it.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use relay_core::{chat_completion_task, ChunkEvent, OpenAiBackend, StreamSettings};
//!
//! let backend = Arc::new(OpenAiBackend::from_config(&config));
//! let mut rx = chat_completion_task(backend, session.request(&config.model, 256), StreamSettings::from(&config));
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         ChunkEvent::Content(text) => println!("{text}"),
//!         ChunkEvent::Failure(message) => eprintln!("{message}"),
//!         ChunkEvent::End => {}
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::backend::{CompletionBackend, CompletionRequest};
use crate::chunk::ChunkBuffer;
use crate::config::RelayConfig;
use crate::streaming::{
    chunk_channel, ChunkReceiver, ChunkSender, ConsumerReport, ConsumerStats, Deadline, Outcome,
    StreamConsumer,
};

/// Per-session streaming parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamSettings {
    /// Wall-clock budget for the whole stream
    pub client_timeout: Duration,
    /// Chunk size limit in bytes
    pub chunk_max: usize,
    /// Idle time before a sentence-boundary flush
    pub chunk_delay: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            client_timeout: Duration::from_secs(60),
            chunk_max: 400,
            chunk_delay: Duration::from_secs(2),
        }
    }
}

impl From<&RelayConfig> for StreamSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            client_timeout: config.client_timeout,
            chunk_max: config.chunk_max,
            chunk_delay: config.chunk_delay,
        }
    }
}

/// Spawn a worker streaming `request` from `backend`
///
/// Returns immediately. Read the receiver until it yields `None`.
pub fn chat_completion_task(
    backend: Arc<dyn CompletionBackend>,
    request: CompletionRequest,
    settings: StreamSettings,
) -> ChunkReceiver {
    let (tx, rx) = chunk_channel();
    let span = tracing::debug_span!(
        "completion",
        id = %Uuid::new_v4(),
        backend = backend.name(),
        model = %request.model
    );

    tokio::spawn(
        async move {
            run_completion(backend.as_ref(), &request, &settings, tx).await;
        }
        .instrument(span),
    );

    rx
}

/// Run one completion on the current task
///
/// Opening the stream counts against the same deadline as reading it. If
/// opening fails there is nothing buffered, so only the failure and
/// [`End`](crate::streaming::ChunkEvent::End) are sent.
pub async fn run_completion(
    backend: &dyn CompletionBackend,
    request: &CompletionRequest,
    settings: &StreamSettings,
    output: ChunkSender,
) -> ConsumerReport {
    let deadline = Deadline::after(settings.client_timeout);

    let stream = match deadline.bound(backend.open_stream(request)).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(error = %err, "Failed to open completion stream");
            if output.failure(err.to_string()).await.is_ok() {
                output.finish().await;
            }
            return ConsumerReport {
                outcome: Outcome::Failed(err),
                stats: ConsumerStats::default(),
            };
        }
    };

    debug!(
        chunk_max = settings.chunk_max,
        chunk_delay_ms = settings.chunk_delay.as_millis() as u64,
        "Completion stream opened"
    );

    let buffer = ChunkBuffer::new(settings.chunk_max, settings.chunk_delay);
    StreamConsumer::new(stream, buffer, deadline, output)
        .run()
        .await
}
