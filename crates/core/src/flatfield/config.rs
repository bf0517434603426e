//! Flat-field configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the flat-field controller and flat pointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatFieldConfig {
    /// Mean counts to aim for.
    #[serde(default = "default_target_counts")]
    pub target_counts: f64,

    /// Shortest usable flat exposure (seconds). Below this, shutter
    /// timing dominates and flats are unusable.
    #[serde(default = "default_min_exposure")]
    pub min_exposure_secs: f64,

    /// Longest usable flat exposure (seconds).
    #[serde(default = "default_max_exposure")]
    pub max_exposure_secs: f64,

    /// Acceptable deviation from the target, as a fraction of it.
    #[serde(default = "default_offset_frac")]
    pub allowed_offset_frac: f64,

    /// Minimum bias-corrected counts; below this a probe is treated as
    /// effectively dark to keep the correction well-conditioned.
    #[serde(default = "default_min_counts")]
    pub min_counts: f64,

    /// Iteration cap for the probe loop.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Reuse one calibration curve across binnings via the binning-area
    /// scaling. Disable for detectors whose flats do not scale linearly
    /// with binning; each binning then gets its own curve.
    #[serde(default)]
    pub combine_binnings: bool,

    /// Altitude of the flat-field sweet spot (degrees).
    #[serde(default = "default_flat_alt")]
    pub flat_alt_deg: f64,

    /// Settling timeout for the flat-pointing slew (seconds).
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_secs: f64,

    /// Motion status poll interval while settling (milliseconds).
    #[serde(default = "default_motion_poll")]
    pub motion_poll_ms: u64,

    /// Camera status poll interval during probe exposures (milliseconds).
    #[serde(default = "default_exposure_poll")]
    pub exposure_poll_ms: u64,
}

fn default_target_counts() -> f64 {
    30_000.0
}

fn default_min_exposure() -> f64 {
    0.5
}

fn default_max_exposure() -> f64 {
    5.0
}

fn default_offset_frac() -> f64 {
    0.2
}

fn default_min_counts() -> f64 {
    100.0
}

fn default_max_iterations() -> u32 {
    10
}

fn default_flat_alt() -> f64 {
    80.0
}

fn default_settle_timeout() -> f64 {
    120.0
}

fn default_motion_poll() -> u64 {
    500
}

fn default_exposure_poll() -> u64 {
    200
}

impl Default for FlatFieldConfig {
    fn default() -> Self {
        Self {
            target_counts: default_target_counts(),
            min_exposure_secs: default_min_exposure(),
            max_exposure_secs: default_max_exposure(),
            allowed_offset_frac: default_offset_frac(),
            min_counts: default_min_counts(),
            max_iterations: default_max_iterations(),
            combine_binnings: false,
            flat_alt_deg: default_flat_alt(),
            settle_timeout_secs: default_settle_timeout(),
            motion_poll_ms: default_motion_poll(),
            exposure_poll_ms: default_exposure_poll(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FlatFieldConfig::default();
        assert_eq!(config.target_counts, 30_000.0);
        assert_eq!(config.min_exposure_secs, 0.5);
        assert_eq!(config.max_exposure_secs, 5.0);
        assert!(!config.combine_binnings);
        assert_eq!(config.flat_alt_deg, 80.0);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            target_counts = 25000.0
            min_exposure_secs = 0.2
            max_exposure_secs = 10.0
            allowed_offset_frac = 0.1
            max_iterations = 20
            combine_binnings = true
        "#;
        let config: FlatFieldConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.target_counts, 25_000.0);
        assert!(config.combine_binnings);
        assert_eq!(config.max_iterations, 20);
    }
}
