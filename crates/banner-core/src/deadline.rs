//! Per-operation deadline and cancellation

use crate::error::{BannerError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Expiry plus cancellation handle carried into every store call.
///
/// Cloning shares the cancellation token, so cancelling any clone aborts
/// every operation running under it.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
    cancel: CancellationToken,
}

impl Deadline {
    /// No expiry; only explicit cancellation stops the operation.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Drive `op` to completion unless the deadline fires first.
    ///
    /// When the deadline wins, `op` is dropped; anything it owns (pooled
    /// connections, open transactions) is released by its destructor.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(BannerError::Cancelled);
        }
        if matches!(self.remaining(), Some(left) if left.is_zero()) {
            return Err(BannerError::DeadlineExceeded);
        }

        let expiry = async {
            match self.expires_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BannerError::Cancelled),
            _ = expiry => Err(BannerError::DeadlineExceeded),
            res = op => res,
        }
    }
}
