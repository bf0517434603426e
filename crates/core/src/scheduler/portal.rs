//! Portal client interface.
//!
//! The portal is the remote scheduling service holding the task queue.
//! Multiple orchestrators may see the same task; the claim operation is
//! the atomic arbiter of who runs it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::task::{Outcome, Task};

#[derive(Debug, Clone, Error)]
pub enum PortalError {
    /// The portal could not be reached.
    #[error("portal transport error: {0}")]
    Transport(String),

    /// The portal understood the request and said no.
    #[error("portal rejected request: {0}")]
    Rejected(String),
}

/// Proof that this orchestrator holds the claim on a task.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimToken {
    pub task_id: String,
    pub granted_at: DateTime<Utc>,
}

/// Result of a claim attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    Granted(ClaimToken),
    /// Another orchestrator claimed the task first.
    Conflict,
}

/// Client for the scheduling portal.
#[async_trait]
pub trait PortalClient: Send + Sync {
    /// Tasks currently scheduled for the given instrument.
    async fn list_tasks(&self, instrument: &str) -> Result<Vec<Task>, PortalError>;

    /// Atomically claims a task. Exactly one claimant is granted; everyone
    /// else sees [`Claim::Conflict`].
    async fn claim(&self, task_id: &str) -> Result<Claim, PortalError>;

    /// Reports the terminal outcome of a claimed task.
    async fn report(&self, task_id: &str, outcome: Outcome) -> Result<(), PortalError>;
}
