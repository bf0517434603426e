//! Scheduler configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Portal poll interval (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long a granted claim may wait for the instrument before it is
    /// given back as aborted (milliseconds).
    #[serde(default = "default_start_grace")]
    pub start_grace_ms: u64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_poll_interval() -> u64 {
    10_000
}

fn default_start_grace() -> u64 {
    10_000
}

fn default_enabled() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            start_grace_ms: default_start_grace(),
            enabled: default_enabled(),
        }
    }
}
