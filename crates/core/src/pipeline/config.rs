//! Pipeline engine configuration.

use serde::{Deserialize, Serialize};

/// Per-operation timeouts and poll intervals for the pipeline engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Settling timeout after a slew (seconds).
    #[serde(default = "default_settle_timeout")]
    pub motion_settle_timeout_secs: f64,

    /// Motion status poll interval (milliseconds).
    #[serde(default = "default_motion_poll")]
    pub motion_poll_ms: u64,

    /// Time to wait for a guiding lock (seconds).
    #[serde(default = "default_guiding_timeout")]
    pub guiding_lock_timeout_secs: f64,

    /// Guiding status poll interval (milliseconds).
    #[serde(default = "default_guiding_poll")]
    pub guiding_poll_ms: u64,

    /// Camera status poll interval during science exposures
    /// (milliseconds).
    #[serde(default = "default_exposure_poll")]
    pub exposure_poll_ms: u64,
}

fn default_settle_timeout() -> f64 {
    120.0
}

fn default_motion_poll() -> u64 {
    500
}

fn default_guiding_timeout() -> f64 {
    60.0
}

fn default_guiding_poll() -> u64 {
    500
}

fn default_exposure_poll() -> u64 {
    200
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            motion_settle_timeout_secs: default_settle_timeout(),
            motion_poll_ms: default_motion_poll(),
            guiding_lock_timeout_secs: default_guiding_timeout(),
            guiding_poll_ms: default_guiding_poll(),
            exposure_poll_ms: default_exposure_poll(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.motion_settle_timeout_secs, 120.0);
        assert_eq!(config.guiding_lock_timeout_secs, 60.0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PipelineConfig = toml::from_str("guiding_lock_timeout_secs = 30.0").unwrap();
        assert_eq!(config.guiding_lock_timeout_secs, 30.0);
        assert_eq!(config.motion_poll_ms, 500);
    }
}
