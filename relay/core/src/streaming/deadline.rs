//! Session deadline

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::backend::StreamError;

/// Fixed wall-clock budget for one completion stream
///
/// Created once when the session starts; every upstream await is bounded by
/// the same expiry instant.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    expires_at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
            budget,
        }
    }

    /// The full budget this deadline was created with
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// When the deadline expires
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Time left before expiry
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Run `fut` until it finishes or the deadline passes
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or [`StreamError::DeadlineExceeded`]
    /// on expiry.
    pub async fn bound<F, T>(&self, fut: F) -> Result<T, StreamError>
    where
        F: Future<Output = Result<T, StreamError>>,
    {
        match timeout_at(self.expires_at, fut).await {
            Ok(result) => result,
            Err(_) => Err(StreamError::DeadlineExceeded(self.budget)),
        }
    }
}
