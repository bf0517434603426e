//! Mock guiding capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::capabilities::{CapabilityError, Guiding, GuidingSetup, GuidingState};

use super::command_log::CommandLog;

const DEVICE: &str = "guiding";

/// Mock implementation of [`Guiding`].
///
/// Locks instantly once engaged. Use [`MockGuiding::hold_status`] to pin
/// the reported state, e.g. to simulate a lock that never arrives.
pub struct MockGuiding {
    log: CommandLog,
    engaged: AtomicBool,
    held: Mutex<Option<GuidingState>>,
}

impl MockGuiding {
    pub fn new(log: CommandLog) -> Self {
        Self {
            log,
            engaged: AtomicBool::new(false),
            held: Mutex::new(None),
        }
    }

    /// Pins the reported guiding state regardless of engage/disengage.
    pub fn hold_status(&self, state: GuidingState) {
        *self.held.lock().unwrap() = Some(state);
    }
}

#[async_trait]
impl Guiding for MockGuiding {
    async fn engage(&self, _setup: GuidingSetup) -> Result<(), CapabilityError> {
        self.log.record(DEVICE, "engage");
        self.engaged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disengage(&self) -> Result<(), CapabilityError> {
        self.log.record(DEVICE, "disengage");
        self.engaged.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self) -> Result<GuidingState, CapabilityError> {
        if let Some(held) = *self.held.lock().unwrap() {
            return Ok(held);
        }
        Ok(if self.engaged.load(Ordering::SeqCst) {
            GuidingState::Locked
        } else {
            GuidingState::Off
        })
    }
}
