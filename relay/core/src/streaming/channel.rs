//! Output channel between the consumer task and its caller

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Slots in the underlying mpsc channel
///
/// A send also waits for the slot to drain again, so the channel behaves as
/// a rendezvous: nothing sits unread while the producer moves on.
const OUTPUT_CAPACITY: usize = 1;

/// What the caller receives
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    /// A chunk of generated text
    Content(String),
    /// The upstream failed; carries its description
    Failure(String),
    /// No more events follow
    End,
}

impl ChunkEvent {
    /// Text of a content event
    #[must_use]
    pub fn as_content(&self) -> Option<&str> {
        match self {
            Self::Content(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this is a failure event
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// The caller hung up
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("chunk receiver dropped")]
pub struct ReceiverDropped;

/// Create a connected sender/receiver pair
#[must_use]
pub fn chunk_channel() -> (ChunkSender, ChunkReceiver) {
    let (tx, rx) = mpsc::channel(OUTPUT_CAPACITY);
    (ChunkSender { tx }, ChunkReceiver { rx })
}

/// Producer half, owned by the consumer task
#[derive(Debug)]
pub struct ChunkSender {
    tx: mpsc::Sender<ChunkEvent>,
}

impl ChunkSender {
    /// Send a content chunk, waiting until the caller has taken it
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverDropped`] if the caller is gone.
    pub async fn content(&self, text: String) -> Result<(), ReceiverDropped> {
        self.send(ChunkEvent::Content(text)).await
    }

    /// Send a failure description, waiting until the caller has taken it
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverDropped`] if the caller is gone.
    pub async fn failure(&self, message: String) -> Result<(), ReceiverDropped> {
        self.send(ChunkEvent::Failure(message)).await
    }

    /// Send [`ChunkEvent::End`] and close the channel
    pub async fn finish(self) {
        // Nobody left to tell if this fails
        let _ = self.send(ChunkEvent::End).await;
    }

    /// Whether the caller has hung up
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, event: ChunkEvent) -> Result<(), ReceiverDropped> {
        self.tx.send(event).await.map_err(|_| ReceiverDropped)?;
        // The slot frees only once the receiver has taken the event
        drop(self.tx.reserve().await.map_err(|_| ReceiverDropped)?);
        Ok(())
    }
}

/// Consumer half, held by the caller
///
/// Read until [`recv`](Self::recv) returns `None`.
#[derive(Debug)]
pub struct ChunkReceiver {
    rx: mpsc::Receiver<ChunkEvent>,
}

impl ChunkReceiver {
    /// Receive the next event; `None` once the channel is closed
    pub async fn recv(&mut self) -> Option<ChunkEvent> {
        self.rx.recv().await
    }

    /// Drain every event until the channel closes
    pub async fn collect_all(mut self) -> Vec<ChunkEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }

    /// Adapt into a [`futures::Stream`]
    #[must_use]
    pub fn into_stream(self) -> ReceiverStream<ChunkEvent> {
        ReceiverStream::new(self.rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_events_arrive_in_order_then_close() {
        let (tx, rx) = chunk_channel();
        tokio::spawn(async move {
            tx.content("a".to_string()).await.unwrap();
            tx.failure("boom".to_string()).await.unwrap();
            tx.finish().await;
        });

        let events = rx.collect_all().await;
        assert_eq!(
            events,
            vec![
                ChunkEvent::Content("a".to_string()),
                ChunkEvent::Failure("boom".to_string()),
                ChunkEvent::End,
            ]
        );
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (tx, rx) = chunk_channel();
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.content("x".to_string()).await, Err(ReceiverDropped));
    }

    #[tokio::test]
    async fn test_send_completes_only_after_read() {
        let (tx, mut rx) = chunk_channel();
        let sender = tokio::spawn(async move { tx.content("first".to_string()).await });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!sender.is_finished());

        assert_eq!(rx.recv().await, Some(ChunkEvent::Content("first".to_string())));
        assert_eq!(sender.await.unwrap(), Ok(()));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_into_stream() {
        let (tx, rx) = chunk_channel();
        tokio::spawn(async move {
            tx.content("x".to_string()).await.unwrap();
            tx.finish().await;
        });

        let events: Vec<ChunkEvent> = rx.into_stream().collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_content(), Some("x"));
        assert!(!events[1].is_failure());
    }
}
