//! Sentence-Aware Chunking
//!
//! Turns an incremental text stream into display-ready chunks. The
//! [`ChunkBuffer`] holds whatever text has not been delivered yet and decides,
//! each time it is polled, whether a prefix of that text is ready to go out.
//!
//! # Flush Rules
//!
//! Rules are evaluated in priority order and the first one that fires wins:
//!
//! 1. **Idle**: the idle timeout has elapsed since the last flush *and* the
//!    buffer contains a sentence boundary. Everything up to the last boundary
//!    is flushed.
//! 2. **Newline**: the buffer contains a newline before `max_size`. Everything
//!    up to and including that newline is flushed.
//! 3. **Size**: the buffer holds at least `max_size` bytes. The first
//!    `max_size` bytes are flushed.
//!
//! Any flush restarts the idle timer.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use relay_core::chunk::{ChunkBuffer, FlushReason};
//!
//! let mut buffer = ChunkBuffer::new(50, Duration::from_secs(2));
//! buffer.append("ab\ncd");
//!
//! let chunk = buffer.try_chunk().unwrap();
//! assert_eq!(chunk.text, "ab\n");
//! assert_eq!(chunk.reason, FlushReason::Newline);
//! assert_eq!(buffer.as_str(), "cd");
//! assert!(buffer.try_chunk().is_none());
//! ```
//!
//! The buffer does no I/O and takes no locks. It is meant to be owned by a
//! single worker, see [`crate::streaming`].

mod boundary;
mod buffer;

pub use boundary::Boundary;
pub use buffer::{Chunk, ChunkBuffer, FlushReason};
