//! Mock acoustic warning device.

use std::time::Duration;

use async_trait::async_trait;

use crate::capabilities::{AcousticWarning, CapabilityError};

use super::command_log::CommandLog;

const DEVICE: &str = "acoustic";

/// Mock implementation of [`AcousticWarning`], recording each warning so
/// tests can assert it preceded motion commands.
pub struct MockAcoustic {
    log: CommandLog,
}

impl MockAcoustic {
    pub fn new(log: CommandLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl AcousticWarning for MockAcoustic {
    async fn warn(&self, duration: Duration) -> Result<(), CapabilityError> {
        self.log
            .record(DEVICE, format!("warn({:.3}s)", duration.as_secs_f64()));
        Ok(())
    }
}
