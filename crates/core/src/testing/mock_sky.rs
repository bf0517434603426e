//! Mock ephemeris and target tracks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::capabilities::{
    CapabilityError, Equatorial, FrameConverter, Horizon, MountFrame, SolarEphemeris, TargetTrack,
};

/// Mock implementation of [`SolarEphemeris`] with a linear altitude trend.
///
/// The sun sits at `base` at construction time and its altitude changes by
/// `alt_rate_deg_per_min`; a negative rate simulates dusk, a positive one
/// dawn.
pub struct MockEphemeris {
    base: Horizon,
    alt_rate_deg_per_min: f64,
    created: DateTime<Utc>,
}

impl MockEphemeris {
    pub fn with_trend(base: Horizon, alt_rate_deg_per_min: f64) -> Self {
        Self {
            base,
            alt_rate_deg_per_min,
            created: Utc::now(),
        }
    }
}

#[async_trait]
impl SolarEphemeris for MockEphemeris {
    async fn sun_horizon(&self, at: DateTime<Utc>) -> Result<Horizon, CapabilityError> {
        let minutes = (at - self.created).num_milliseconds() as f64 / 60_000.0;
        Ok(Horizon::new(
            self.base.alt_deg + self.alt_rate_deg_per_min * minutes,
            self.base.az_deg,
        ))
    }
}

/// Mock implementation of [`TargetTrack`] with linear RA drift.
pub struct MockTargetTrack {
    base: Equatorial,
    ra_rate_deg_per_sec: f64,
    created: DateTime<Utc>,
}

impl MockTargetTrack {
    /// A target that never moves.
    pub fn fixed(position: Equatorial) -> Self {
        Self::drifting(position, 0.0)
    }

    /// A target drifting in RA at a constant rate from construction time.
    pub fn drifting(position: Equatorial, ra_rate_deg_per_sec: f64) -> Self {
        Self {
            base: position,
            ra_rate_deg_per_sec,
            created: Utc::now(),
        }
    }
}

#[async_trait]
impl TargetTrack for MockTargetTrack {
    async fn position_at(&self, at: DateTime<Utc>) -> Result<Equatorial, CapabilityError> {
        let secs = (at - self.created).num_milliseconds() as f64 / 1_000.0;
        Ok(Equatorial::new(
            self.base.ra_deg + self.ra_rate_deg_per_sec * secs,
            self.base.dec_deg,
        ))
    }
}

/// Mock implementation of [`FrameConverter`] that scales both axes by a
/// constant factor, so a sky angle maps to a different angle on the mount
/// axes.
pub struct MockFrameConverter {
    scale: f64,
}

impl MockFrameConverter {
    /// A mount frame aligned with the equatorial one.
    pub fn identity() -> Self {
        Self::scaled(1.0)
    }

    /// A mount frame where every sky degree is `scale` mount degrees.
    pub fn scaled(scale: f64) -> Self {
        Self { scale }
    }
}

#[async_trait]
impl FrameConverter for MockFrameConverter {
    async fn to_mount_frame(
        &self,
        target: Equatorial,
        _at: DateTime<Utc>,
    ) -> Result<MountFrame, CapabilityError> {
        Ok(MountFrame {
            lat_deg: target.dec_deg * self.scale,
            lon_deg: target.ra_deg * self.scale,
        })
    }

    async fn to_equatorial(
        &self,
        native: MountFrame,
        _at: DateTime<Utc>,
    ) -> Result<Equatorial, CapabilityError> {
        Ok(Equatorial::new(
            native.lon_deg / self.scale,
            native.lat_deg / self.scale,
        ))
    }
}
