//! Safety monitor configuration.

use serde::{Deserialize, Serialize};

use super::types::SafetyLimits;

/// Configuration for the safety monitor and the acoustic motion warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// How often to poll the weather capability (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Minimum delay between the acoustic warning and any autonomous
    /// motion command (seconds).
    #[serde(default = "default_motion_grace")]
    pub motion_grace_secs: f64,

    /// Weather limits.
    #[serde(default)]
    pub limits: SafetyLimits,
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_motion_grace() -> f64 {
    5.0
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            motion_grace_secs: default_motion_grace(),
            limits: SafetyLimits::default(),
        }
    }
}
