//! Completion turns and terminal output

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use relay_core::{
    chat_completion_task, split_response, ChunkEvent, CompletionBackend, OpenAiBackend,
    RelayConfig, Session, StreamSettings,
};

/// What one completion turn produced
#[derive(Debug, Default)]
pub struct Turn {
    /// Concatenated content chunks
    pub text: String,
    /// Upstream failure, if any
    pub failure: Option<String>,
}

/// Runs completion turns against one backend, keeping conversation history
pub struct Relay {
    config: RelayConfig,
    backend: Arc<dyn CompletionBackend>,
    session: Session,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        let backend: Arc<dyn CompletionBackend> = Arc::new(OpenAiBackend::from_config(&config));
        let session = Session::from_config(&config);
        Self {
            config,
            backend,
            session,
        }
    }

    /// Send a single prompt; a failed completion is an error
    pub async fn run_once(&mut self, prompt: &str) -> Result<()> {
        let turn = self.turn(prompt).await?;
        match turn.failure {
            Some(failure) => anyhow::bail!("Completion failed: {failure}"),
            None => Ok(()),
        }
    }

    /// One prompt per stdin line until EOF
    pub async fn run_interactive(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let prompt = line.trim();
            if prompt.is_empty() {
                continue;
            }
            // Failures are reported inline; the conversation goes on
            self.turn(prompt).await?;
        }

        Ok(())
    }

    async fn turn(&mut self, prompt: &str) -> Result<Turn> {
        self.session.add_user_message(prompt);
        self.session.stats();

        let request = self
            .session
            .request(&self.config.model, self.config.max_tokens);
        let mut rx = chat_completion_task(
            Arc::clone(&self.backend),
            request,
            StreamSettings::from(&self.config),
        );

        let mut stdout = tokio::io::stdout();
        let mut turn = Turn::default();

        while let Some(event) = rx.recv().await {
            match event {
                ChunkEvent::Content(text) => {
                    for line in split_response(&text, self.config.max_line_length) {
                        stdout.write_all(line.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                    }
                    stdout.flush().await?;
                    turn.text.push_str(&text);
                }
                ChunkEvent::Failure(message) => {
                    warn!(error = %message, "Completion failed");
                    let mut stderr = tokio::io::stderr();
                    stderr
                        .write_all(format!("error: {message}\n").as_bytes())
                        .await?;
                    turn.failure = Some(message);
                }
                ChunkEvent::End => debug!(bytes = turn.text.len(), "Completion ended"),
            }
        }

        if !turn.text.is_empty() {
            self.session.add_assistant_message(turn.text.clone());
        }

        Ok(turn)
    }
}
