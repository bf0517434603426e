//! Trait definitions for device capabilities.
//!
//! Each physical device module implements the subset of these traits it
//! supports; the orchestrator depends only on the traits. Commands return
//! promptly, completion is observed by polling the matching status
//! operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::CapabilityError;
use super::types::{
    Equatorial, ExposureRequest, ExposureStatus, GuidingSetup, GuidingState, Horizon, ImageHandle,
    MotionState, MountFrame, WeatherMode, WeatherSample,
};

/// Telescope pointing.
#[async_trait]
pub trait Pointing: Send + Sync {
    /// Starts a slew to an equatorial position and begins tracking it.
    async fn slew_to(&self, target: Equatorial) -> Result<(), CapabilityError>;

    /// Starts a slew to a fixed horizon position (no tracking).
    async fn slew_horizon(&self, target: Horizon) -> Result<(), CapabilityError>;

    /// Applies a small pointing correction on top of the current position.
    async fn offset_by(&self, offset: super::types::PointingOffset)
        -> Result<(), CapabilityError>;

    /// Actively stops any motion in progress.
    async fn stop_motion(&self) -> Result<(), CapabilityError>;

    /// Current pointing position.
    async fn position(&self) -> Result<Equatorial, CapabilityError>;
}

/// Motion status of a device with moving parts.
///
/// Separate from [`Pointing`] so that domes, filter wheels and focusers can
/// expose settling without exposing slews.
#[async_trait]
pub trait MotionStatus: Send + Sync {
    async fn motion_state(&self) -> Result<MotionState, CapabilityError>;
}

/// Autoguiding.
#[async_trait]
pub trait Guiding: Send + Sync {
    /// Starts the guiding loop. Returns once the loop is running;
    /// lock acquisition is observed via [`Guiding::status`].
    async fn engage(&self, setup: GuidingSetup) -> Result<(), CapabilityError>;

    /// Stops the guiding loop.
    async fn disengage(&self) -> Result<(), CapabilityError>;

    async fn status(&self) -> Result<GuidingState, CapabilityError>;
}

/// Science camera.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Starts an exposure. Returns promptly; progress is polled via
    /// [`Camera::exposure_status`].
    async fn start_exposure(&self, request: ExposureRequest) -> Result<(), CapabilityError>;

    async fn exposure_status(&self) -> Result<ExposureStatus, CapabilityError>;

    /// Actively aborts the exposure in progress, if any.
    async fn abort_exposure(&self) -> Result<(), CapabilityError>;

    /// Reads out the completed exposure.
    async fn read_out(&self) -> Result<ImageHandle, CapabilityError>;
}

/// Filter wheel.
#[async_trait]
pub trait FilterWheel: Send + Sync {
    async fn set_filter(&self, name: &str) -> Result<(), CapabilityError>;

    async fn current_filter(&self) -> Result<String, CapabilityError>;
}

/// Weather station.
#[async_trait]
pub trait Weather: Send + Sync {
    /// Latest available sample. Push devices return their cached sample.
    async fn current(&self) -> Result<WeatherSample, CapabilityError>;

    fn mode(&self) -> WeatherMode;
}

/// Acoustic warning device announcing imminent autonomous motion.
#[async_trait]
pub trait AcousticWarning: Send + Sync {
    async fn warn(&self, duration: std::time::Duration) -> Result<(), CapabilityError>;
}

/// Frame conversion for lat/lon-mounted telescopes.
#[async_trait]
pub trait FrameConverter: Send + Sync {
    async fn to_mount_frame(
        &self,
        target: Equatorial,
        at: DateTime<Utc>,
    ) -> Result<MountFrame, CapabilityError>;

    async fn to_equatorial(
        &self,
        native: MountFrame,
        at: DateTime<Utc>,
    ) -> Result<Equatorial, CapabilityError>;
}

/// Position over time of a moving target (the sun, a planet, a satellite).
#[async_trait]
pub trait TargetTrack: Send + Sync {
    async fn position_at(&self, at: DateTime<Utc>) -> Result<Equatorial, CapabilityError>;
}

/// Solar position provider, used for flat-field pointing and twilight
/// detection. The actual ephemeris math lives outside the orchestrator.
#[async_trait]
pub trait SolarEphemeris: Send + Sync {
    async fn sun_horizon(&self, at: DateTime<Utc>) -> Result<Horizon, CapabilityError>;
}

/// Photometric measurement on an image, consumed by flat-fielding.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Mean counts over the configured measurement frame of the image.
    async fn mean_counts(&self, image: &ImageHandle) -> Result<f64, CapabilityError>;
}
