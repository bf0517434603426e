//! Cooperative settling wait over any motion-status capability.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::capabilities::{CapabilityError, MotionState, MotionStatus};
use crate::safety::CancelSignal;

/// Errors from waiting on motion to settle.
#[derive(Debug, Error)]
pub enum MotionWaitError {
    /// The device did not settle within the allowed time.
    #[error("motion did not settle within {0:?}")]
    Timeout(Duration),

    /// The run was cancelled during the wait.
    #[error("wait cancelled")]
    Cancelled,

    /// The device reported a motion fault.
    #[error("device reported motion fault")]
    MotionFault,

    /// Status query failed.
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Wraps any capability exposing motion status with a single
/// "wait until settled or timeout" operation.
///
/// Composition, not inheritance: any device that can report motion gets
/// the wait behavior without touching its implementation.
pub struct WaitForMotion {
    inner: Arc<dyn MotionStatus>,
    poll_interval: Duration,
}

impl WaitForMotion {
    pub fn new(inner: Arc<dyn MotionStatus>, poll_interval: Duration) -> Self {
        Self {
            inner,
            poll_interval,
        }
    }

    /// Suspends until the device settles, the timeout elapses, or the run
    /// is cancelled. Never busy-waits; each poll is a suspension point.
    pub async fn wait_until_settled(
        &self,
        timeout: Duration,
        cancel: &CancelSignal,
    ) -> Result<(), MotionWaitError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let state = self.inner.motion_state().await?;
            if state.is_settled() {
                debug!(?state, "motion settled");
                return Ok(());
            }
            if state == MotionState::Error {
                return Err(MotionWaitError::MotionFault);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(MotionWaitError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(MotionWaitError::Timeout(timeout));
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
