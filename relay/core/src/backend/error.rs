//! Upstream stream failures

use std::time::Duration;

use thiserror::Error;

/// Why an upstream completion stream failed
///
/// End-of-stream is not an error; [`CompletionStream::recv`] reports it as
/// `Ok(None)`.
///
/// [`CompletionStream::recv`]: super::CompletionStream::recv
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// Network or connection failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success HTTP status
    #[error("{backend} returned {status}: {body}")]
    Api {
        /// Backend name
        backend: String,
        /// HTTP status code
        status: u16,
        /// Response body or extracted error message
        body: String,
    },

    /// A stream event could not be decoded
    #[error("malformed stream event: {0}")]
    Decode(String),

    /// The provider reported an error inside the stream
    #[error("provider error: {0}")]
    Provider(String),

    /// The session deadline expired
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
