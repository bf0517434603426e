//! Mock portal client.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::scheduler::{Claim, ClaimToken, PortalClient, PortalError};
use crate::task::{Outcome, Task};

/// Mock implementation of [`PortalClient`].
///
/// The claim operation is atomic over the shared claim set, so two
/// schedulers racing for the same task get exactly one grant between them.
/// Reporting an outcome removes the task from the queue.
pub struct MockPortal {
    tasks: Mutex<Vec<Task>>,
    claimed: Mutex<HashSet<String>>,
    reports: Mutex<Vec<(String, Outcome)>>,
}

impl Default for MockPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPortal {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            claimed: Mutex::new(HashSet::new()),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn push_task(&self, task: Task) {
        self.tasks.lock().unwrap().push(task);
    }

    /// All reported outcomes, in report order.
    pub fn reports(&self) -> Vec<(String, Outcome)> {
        self.reports.lock().unwrap().clone()
    }

    /// Task ids that have been claimed.
    pub fn claimed(&self) -> Vec<String> {
        self.claimed.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl PortalClient for MockPortal {
    async fn list_tasks(&self, instrument: &str) -> Result<Vec<Task>, PortalError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.instrument == instrument)
            .cloned()
            .collect())
    }

    async fn claim(&self, task_id: &str) -> Result<Claim, PortalError> {
        let mut claimed = self.claimed.lock().unwrap();
        if !claimed.insert(task_id.to_string()) {
            return Ok(Claim::Conflict);
        }
        Ok(Claim::Granted(ClaimToken {
            task_id: task_id.to_string(),
            granted_at: Utc::now(),
        }))
    }

    async fn report(&self, task_id: &str, outcome: Outcome) -> Result<(), PortalError> {
        self.reports
            .lock()
            .unwrap()
            .push((task_id.to_string(), outcome));
        self.tasks.lock().unwrap().retain(|t| t.id != task_id);
        Ok(())
    }
}
