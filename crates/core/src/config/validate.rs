use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Instrument name is non-empty
/// - Poll intervals are non-zero
/// - The flat-field exposure range and tolerance band are sane
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.instrument.name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "instrument.name cannot be empty".to_string(),
        ));
    }

    if config.safety.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "safety.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.scheduler.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    let flat = &config.flatfield;
    if flat.min_exposure_secs <= 0.0 || flat.min_exposure_secs >= flat.max_exposure_secs {
        return Err(ConfigError::ValidationError(
            "flatfield exposure range must satisfy 0 < min < max".to_string(),
        ));
    }
    if flat.allowed_offset_frac <= 0.0 || flat.allowed_offset_frac >= 1.0 {
        return Err(ConfigError::ValidationError(
            "flatfield.allowed_offset_frac must be in (0, 1)".to_string(),
        ));
    }

    Ok(())
}
