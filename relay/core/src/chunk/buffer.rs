//! Chunk Buffer Implementation

use std::time::{Duration, Instant};

use super::boundary::Boundary;

/// Which rule produced a chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlushReason {
    /// Idle timeout elapsed and a sentence boundary was found
    Idle,
    /// A newline appeared before the size limit
    Newline,
    /// The buffer reached the size limit
    Size,
    /// Whatever was left when the stream ended
    Residual,
}

impl std::fmt::Display for FlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Newline => write!(f, "newline"),
            Self::Size => write!(f, "size"),
            Self::Residual => write!(f, "residual"),
        }
    }
}

/// A flushed prefix of the buffer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// The flushed text
    pub text: String,
    /// The rule that produced it
    pub reason: FlushReason,
}

impl Chunk {
    /// Consume the chunk, keeping only its text
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Accumulates streamed text and decides when a prefix is ready
///
/// Text only ever leaves from the front, so the buffer content is always
/// everything appended minus everything flushed, in order.
#[derive(Debug)]
pub struct ChunkBuffer {
    /// Unflushed text
    content: String,
    /// Size limit in bytes (at least 1)
    max_size: usize,
    /// Inactivity required before an idle flush is attempted
    idle_timeout: Duration,
    /// When the last flush of any kind happened
    last_flush_at: Instant,
    /// Sentence terminator recognizer
    boundary: Boundary,
}

impl ChunkBuffer {
    /// Create a buffer with the sentence boundary recognizer
    ///
    /// A `max_size` of zero is treated as one.
    #[must_use]
    pub fn new(max_size: usize, idle_timeout: Duration) -> Self {
        Self::with_boundary(max_size, idle_timeout, Boundary::sentence())
    }

    /// Create a buffer with a custom boundary recognizer
    #[must_use]
    pub fn with_boundary(max_size: usize, idle_timeout: Duration, boundary: Boundary) -> Self {
        Self {
            content: String::new(),
            max_size: max_size.max(1),
            idle_timeout,
            last_flush_at: Instant::now(),
            boundary,
        }
    }

    /// Set the origin of the idle timer
    #[must_use]
    pub fn starting_at(mut self, now: Instant) -> Self {
        self.last_flush_at = now;
        self
    }

    /// Size limit in bytes
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Idle timeout
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// When the idle timer was last restarted
    #[must_use]
    pub fn last_flush_at(&self) -> Instant {
        self.last_flush_at
    }

    /// Unflushed text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Unflushed length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Append streamed text
    ///
    /// Never flushes; poll [`try_chunk`](Self::try_chunk) afterwards until it
    /// returns `None`.
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Flush the next ready chunk, if any, using the current time
    pub fn try_chunk(&mut self) -> Option<Chunk> {
        self.try_chunk_at(Instant::now())
    }

    /// Flush the next ready chunk, if any, as of `now`
    pub fn try_chunk_at(&mut self, now: Instant) -> Option<Chunk> {
        if now.saturating_duration_since(self.last_flush_at) >= self.idle_timeout {
            if let Some(end) = self.boundary.last_match_end(&self.content) {
                return Some(self.flush(end, FlushReason::Idle, now));
            }
        }

        // A newline past the limit is left for the size rule
        if let Some(index) = self.content.find('\n') {
            if index < self.max_size {
                return Some(self.flush(index + 1, FlushReason::Newline, now));
            }
        }

        if self.content.len() >= self.max_size {
            let end = self.size_cut();
            return Some(self.flush(end, FlushReason::Size, now));
        }

        None
    }

    /// Remove everything that is left, even if empty
    pub fn take_residual(&mut self) -> Chunk {
        let end = self.content.len();
        self.flush(end, FlushReason::Residual, Instant::now())
    }

    /// Largest char boundary within the size limit, or the first whole
    /// character when the limit is narrower than it
    fn size_cut(&self) -> usize {
        let mut end = self.max_size;
        while !self.content.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = self.content.chars().next().map_or(0, char::len_utf8);
        }
        end
    }

    fn flush(&mut self, end: usize, reason: FlushReason, now: Instant) -> Chunk {
        let rest = self.content.split_off(end);
        let text = std::mem::replace(&mut self.content, rest);
        self.last_flush_at = now;

        tracing::trace!(
            reason = %reason,
            bytes = text.len(),
            retained = self.content.len(),
            "Flushed chunk"
        );

        Chunk { text, reason }
    }
}
