//! Acquisition configuration.

use serde::{Deserialize, Serialize};

/// Configuration for target acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Exposure time of the acquisition probe image (seconds).
    #[serde(default = "default_probe_exposure")]
    pub probe_exposure_secs: f64,

    /// Attempts per variant before falling back to the next one.
    #[serde(default = "default_attempts")]
    pub attempts_per_method: u32,

    /// Search radius for the bright-star variant (degrees).
    #[serde(default = "default_search_radius")]
    pub search_radius_deg: f64,

    /// Camera status poll interval during probe exposures (milliseconds).
    #[serde(default = "default_poll")]
    pub exposure_poll_ms: u64,
}

fn default_probe_exposure() -> f64 {
    5.0
}

fn default_attempts() -> u32 {
    2
}

fn default_search_radius() -> f64 {
    0.5
}

fn default_poll() -> u64 {
    200
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            probe_exposure_secs: default_probe_exposure(),
            attempts_per_method: default_attempts(),
            search_radius_deg: default_search_radius(),
            exposure_poll_ms: default_poll(),
        }
    }
}
