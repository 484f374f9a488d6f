//! Interruptible period wait
//!
//! The engine's only idle suspension point. [`Scheduler::wait`] sleeps for
//! the update period but returns the moment the shutdown token is
//! cancelled. There is no polling: the wait is one timer raced against the
//! token's notification.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why [`Scheduler::wait`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The full period elapsed
    Elapsed,
    /// Shutdown was requested
    Shutdown,
}

/// Waits out the update period unless shutdown is requested
#[derive(Debug, Clone)]
pub struct Scheduler {
    period: Duration,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(period: Duration, shutdown: CancellationToken) -> Self {
        Self { period, shutdown }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// `true` until shutdown was requested
    pub fn should_continue(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Wait for the period or until shutdown, whichever comes first
    pub async fn wait(&self) -> Wake {
        if self.shutdown.is_cancelled() {
            return Wake::Shutdown;
        }

        tokio::select! {
            biased;

            _ = self.shutdown.cancelled() => {
                debug!("Period wait interrupted by shutdown");
                Wake::Shutdown
            }
            _ = tokio::time::sleep(self.period) => Wake::Elapsed,
        }
    }
}
