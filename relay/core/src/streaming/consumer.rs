//! Stream Consumer Implementation
//!
//! The worker loop that feeds one upstream stream into one chunk buffer.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::channel::{ChunkSender, ReceiverDropped};
use super::deadline::Deadline;
use crate::backend::{CompletionStream, StreamError};
use crate::chunk::{Chunk, ChunkBuffer, FlushReason};

/// How a session ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream reached end-of-stream
    Completed,
    /// Upstream failed (including deadline expiry)
    Failed(StreamError),
    /// The caller dropped its receiver
    Abandoned,
}

/// Counters for one session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Deltas received from upstream
    pub deltas: u32,
    /// Chunks flushed by the idle rule
    pub idle_chunks: u32,
    /// Chunks flushed by the newline rule
    pub newline_chunks: u32,
    /// Chunks flushed by the size rule
    pub size_chunks: u32,
    /// Bytes delivered as content, residual included
    pub bytes: usize,
    /// Wall time of the session
    pub duration: Duration,
}

impl ConsumerStats {
    fn record(&mut self, chunk: &Chunk) {
        match chunk.reason {
            FlushReason::Idle => self.idle_chunks += 1,
            FlushReason::Newline => self.newline_chunks += 1,
            FlushReason::Size => self.size_chunks += 1,
            FlushReason::Residual => {}
        }
        self.bytes += chunk.text.len();
    }

    /// Chunks delivered before the residual flush
    #[must_use]
    pub fn chunks(&self) -> u32 {
        self.idle_chunks + self.newline_chunks + self.size_chunks
    }
}

/// Result of running a consumer to the end
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerReport {
    /// How the session ended
    pub outcome: Outcome,
    /// Session counters
    pub stats: ConsumerStats,
}

/// Releases the upstream exactly once, whichever way the loop exits
struct Upstream(Box<dyn CompletionStream>);

impl Drop for Upstream {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Drives one upstream stream to completion or failure
///
/// Sole owner of its [`ChunkBuffer`] and sole producer on its output
/// channel. Chunks are forwarded as soon as the buffer releases them; when
/// the stream ends (or fails) whatever is left is sent as one final chunk,
/// even if empty, followed by [`ChunkEvent::End`].
///
/// [`ChunkEvent::End`]: super::ChunkEvent::End
pub struct StreamConsumer {
    upstream: Upstream,
    buffer: ChunkBuffer,
    deadline: Deadline,
    output: ChunkSender,
    stats: ConsumerStats,
}

impl StreamConsumer {
    /// Assemble a session
    #[must_use]
    pub fn new(
        upstream: Box<dyn CompletionStream>,
        buffer: ChunkBuffer,
        deadline: Deadline,
        output: ChunkSender,
    ) -> Self {
        Self {
            upstream: Upstream(upstream),
            buffer,
            deadline,
            output,
            stats: ConsumerStats::default(),
        }
    }

    /// Run until the upstream ends, fails, or the caller hangs up
    pub async fn run(mut self) -> ConsumerReport {
        let started = Instant::now();
        let outcome = self.drive().await.unwrap_or(Outcome::Abandoned);

        let Self {
            upstream,
            output,
            mut stats,
            ..
        } = self;
        drop(upstream);

        if outcome != Outcome::Abandoned {
            output.finish().await;
        }

        stats.duration = started.elapsed();
        debug!(
            outcome = ?outcome,
            deltas = stats.deltas,
            chunks = stats.chunks(),
            bytes = stats.bytes,
            duration_ms = stats.duration.as_millis() as u64,
            "Stream session finished"
        );

        ConsumerReport { outcome, stats }
    }

    async fn drive(&mut self) -> Result<Outcome, ReceiverDropped> {
        loop {
            match self.deadline.bound(self.upstream.0.recv()).await {
                Ok(Some(delta)) => {
                    self.stats.deltas += 1;
                    if !delta.content.is_empty() {
                        self.buffer.append(&delta.content);
                    }
                    while let Some(chunk) = self.buffer.try_chunk() {
                        self.forward(chunk).await?;
                    }
                }
                Ok(None) => {
                    self.flush_residual().await?;
                    return Ok(Outcome::Completed);
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        buffered = self.buffer.len(),
                        "Upstream stream failed"
                    );
                    self.output.failure(err.to_string()).await?;
                    self.flush_residual().await?;
                    return Ok(Outcome::Failed(err));
                }
            }
        }
    }

    async fn forward(&mut self, chunk: Chunk) -> Result<(), ReceiverDropped> {
        self.stats.record(&chunk);
        self.output.content(chunk.into_text()).await
    }

    async fn flush_residual(&mut self) -> Result<(), ReceiverDropped> {
        let residual = self.buffer.take_residual();
        self.forward(residual).await
    }
}
