//! OpenAI-Compatible Backend
//!
//! Streams chat completions from any server implementing the OpenAI
//! `/chat/completions` endpoint with `stream: true`.
//!
//! # Wire Format
//!
//! The response body is a server-sent-events stream. Each event is a
//! `data: {json}` line carrying a completion chunk; the stream ends with
//! `data: [DONE]` (or simply when the body ends). Lines are split on `\n`
//! before decoding, so multi-byte characters split across network reads are
//! reassembled correctly.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::error::StreamError;
use super::traits::{CompletionBackend, CompletionRequest, CompletionStream, Delta, Role};

const BACKEND_NAME: &str = "OpenAI";

/// Longest event line accepted before the stream is treated as malformed
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// OpenAI-compatible backend client
#[derive(Clone)]
pub struct OpenAiBackend {
    /// API base URL, e.g. `https://api.openai.com/v1`
    base_url: String,
    /// Bearer token
    api_key: Option<String>,
    /// HTTP client
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Create a backend for `base_url`
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            http_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from the completion section of a [`RelayConfig`](crate::config::RelayConfig)
    #[must_use]
    pub fn from_config(config: &crate::config::RelayConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

impl<'a> From<&'a CompletionRequest> for WireRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            max_tokens: (request.max_tokens > 0).then_some(request.max_tokens),
            stream: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireChunk {
    choices: Vec<WireChoice>,
    error: Option<WireError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireChoice {
    delta: WireDelta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireDelta {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireError,
}

/// A decoded server-sent-events line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventLine {
    /// Blank line, comment, or a field this client ignores
    Skip,
    /// The `[DONE]` sentinel
    Done,
    /// A completion chunk
    Delta(Delta),
}

/// Decode one line of an OpenAI completion stream
///
/// Chunks without choices decode to an empty delta.
///
/// # Errors
///
/// Returns [`StreamError::Decode`] for malformed JSON and
/// [`StreamError::Provider`] when the event carries an error object.
pub fn parse_event_line(line: &str) -> Result<EventLine, StreamError> {
    let line = line.trim_end_matches('\r');
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(EventLine::Skip);
    };
    let payload = payload.trim_start();

    if payload.is_empty() {
        return Ok(EventLine::Skip);
    }
    if payload == "[DONE]" {
        return Ok(EventLine::Done);
    }

    let chunk: WireChunk =
        serde_json::from_str(payload).map_err(|e| StreamError::Decode(e.to_string()))?;

    if let Some(error) = chunk.error {
        return Err(StreamError::Provider(error.message));
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .unwrap_or_default();

    Ok(EventLine::Delta(Delta { content }))
}

/// An open OpenAI completion stream
pub struct OpenAiStream {
    /// Response body
    body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    /// Bytes received but not yet split into lines
    pending: Vec<u8>,
    /// The body has been fully read
    body_done: bool,
    /// End-of-stream has been reported
    finished: bool,
    /// The connection has been released
    closed: bool,
}

impl OpenAiStream {
    fn new(body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>) -> Self {
        Self {
            body,
            pending: Vec::new(),
            body_done: false,
            finished: false,
            closed: false,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, StreamError> {
        let Some(pos) = self.pending.iter().position(|&b| b == b'\n') else {
            if self.pending.len() > MAX_LINE_BYTES {
                return Err(StreamError::Decode(format!(
                    "event line exceeds {MAX_LINE_BYTES} bytes"
                )));
            }
            return Ok(None);
        };
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.truncate(pos);
        String::from_utf8(line)
            .map(Some)
            .map_err(|e| StreamError::Decode(format!("invalid UTF-8 in event line: {e}")))
    }
}

#[async_trait]
impl CompletionStream for OpenAiStream {
    async fn recv(&mut self) -> Result<Option<Delta>, StreamError> {
        loop {
            if self.finished || self.closed {
                return Ok(None);
            }

            if let Some(line) = self.next_line()? {
                match parse_event_line(&line)? {
                    EventLine::Skip => continue,
                    EventLine::Done => {
                        self.finished = true;
                        return Ok(None);
                    }
                    EventLine::Delta(delta) => return Ok(Some(delta)),
                }
            }

            if self.body_done {
                self.finished = true;
                return Ok(None);
            }

            match self.body.next().await {
                Some(Ok(bytes)) => self.pending.extend_from_slice(&bytes),
                Some(Err(e)) => return Err(e.into()),
                None => {
                    self.body_done = true;
                    if !self.pending.is_empty() {
                        self.pending.push(b'\n');
                    }
                }
            }
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.body = stream::empty().boxed();
        self.pending.clear();
        tracing::debug!(backend = BACKEND_NAME, "Upstream stream released");
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn open_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<Box<dyn CompletionStream>, StreamError> {
        let url = self.completions_url();
        let body = WireRequest::from(request);

        let mut builder = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            "Opening completion stream"
        );

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<WireErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            return Err(StreamError::Api {
                backend: BACKEND_NAME.to_string(),
                status,
                body,
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(Box::new(OpenAiStream::new(body)))
    }
}
