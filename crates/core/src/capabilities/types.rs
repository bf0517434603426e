//! Shared types for device capabilities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A position in the equatorial frame (ICRS), in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    /// Right ascension in degrees.
    pub ra_deg: f64,
    /// Declination in degrees.
    pub dec_deg: f64,
}

impl Equatorial {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    /// Angular separation to another position, in degrees.
    ///
    /// Small-angle approximation with cos(dec) correction on the RA axis;
    /// good enough for offset/tolerance checks well below a degree.
    pub fn separation_deg(&self, other: &Equatorial) -> f64 {
        let d_ra = (self.ra_deg - other.ra_deg) * self.dec_deg.to_radians().cos();
        let d_dec = self.dec_deg - other.dec_deg;
        (d_ra * d_ra + d_dec * d_dec).sqrt()
    }

    /// Offset that moves `self` onto `target`.
    pub fn offset_to(&self, target: &Equatorial) -> PointingOffset {
        PointingOffset {
            d_ra_deg: target.ra_deg - self.ra_deg,
            d_dec_deg: target.dec_deg - self.dec_deg,
        }
    }
}

/// A position in the local horizon frame, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    /// Altitude above the horizon in degrees.
    pub alt_deg: f64,
    /// Azimuth in degrees, north through east.
    pub az_deg: f64,
}

impl Horizon {
    pub fn new(alt_deg: f64, az_deg: f64) -> Self {
        Self { alt_deg, az_deg }
    }
}

/// A position in a mount-native lat/lon-referenced frame, as used by
/// solar and other fixed-frame telescopes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MountFrame {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl MountFrame {
    /// Separation to another native position, in degrees along the
    /// mount's own axes.
    pub fn separation_deg(&self, other: &MountFrame) -> f64 {
        let d_lat = self.lat_deg - other.lat_deg;
        let d_lon = self.lon_deg - other.lon_deg;
        (d_lat * d_lat + d_lon * d_lon).sqrt()
    }
}

/// A pointing correction produced by acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointingOffset {
    pub d_ra_deg: f64,
    pub d_dec_deg: f64,
}

impl PointingOffset {
    pub const ZERO: PointingOffset = PointingOffset {
        d_ra_deg: 0.0,
        d_dec_deg: 0.0,
    };

    /// Magnitude of the offset in degrees.
    pub fn magnitude_deg(&self) -> f64 {
        (self.d_ra_deg * self.d_ra_deg + self.d_dec_deg * self.d_dec_deg).sqrt()
    }
}

/// Motion state of a device with moving parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    /// Not moving, not tracking.
    Idle,
    /// Large motion towards a new position.
    Slewing,
    /// Small corrections after a slew.
    Settling,
    /// Following a target.
    Tracking,
    /// Stowed in park position.
    Parked,
    /// Hardware reports a motion fault.
    Error,
}

impl MotionState {
    /// Whether the device has come to rest at its commanded position.
    pub fn is_settled(&self) -> bool {
        matches!(self, MotionState::Idle | MotionState::Tracking)
    }
}

/// Guiding loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidingState {
    /// Guiding is not running.
    Off,
    /// Guiding started, no lock yet.
    Engaging,
    /// Locked onto a guide star.
    Locked,
    /// Lock was lost, trying to re-acquire.
    Lost,
}

/// Parameters for engaging the guiding loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuidingSetup {
    /// Guide camera exposure time in seconds.
    pub exposure_secs: f64,
}

impl Default for GuidingSetup {
    fn default() -> Self {
        Self { exposure_secs: 1.0 }
    }
}

/// What an exposure is for; drives shutter and calibration handling
/// in the device module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Science,
    Bias,
    SkyFlat,
}

/// A single exposure command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRequest {
    pub duration_secs: f64,
    pub image_type: ImageType,
    pub binning: u32,
}

impl ExposureRequest {
    pub fn new(duration_secs: f64, image_type: ImageType, binning: u32) -> Self {
        Self {
            duration_secs,
            image_type,
            binning,
        }
    }

    /// A zero-length exposure used to measure the detector bias level.
    pub fn bias(binning: u32) -> Self {
        Self::new(0.0, ImageType::Bias, binning)
    }
}

/// Camera exposure progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureStatus {
    Idle,
    Exposing,
    ReadingOut,
    Complete,
}

/// Reference to an image produced by the camera.
///
/// The orchestrator never touches pixel data itself; images are handed to
/// the configured analyzer/solver through this handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub id: String,
    pub taken_at: DateTime<Utc>,
    pub exposure_secs: f64,
    pub binning: u32,
    pub image_type: ImageType,
}

/// One safety-relevant weather reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// When the reading was taken at the source.
    pub time: DateTime<Utc>,
    /// Fractional cloud cover, 0.0 (clear) to 1.0 (overcast).
    pub cloud_cover: f64,
    /// Wind speed in m/s.
    pub wind_speed_ms: f64,
    /// Altitude of the sun above the horizon in degrees (negative at night).
    pub sun_alt_deg: f64,
    /// Whether the rain sensor is triggered.
    pub rain: bool,
}

/// How a weather device delivers samples.
///
/// Push devices cache their latest received sample, so a consumer can
/// still poll `current()` on either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherMode {
    Poll,
    Push,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separation_and_offset() {
        let a = Equatorial::new(10.0, 0.0);
        let b = Equatorial::new(10.5, 0.0);
        assert!((a.separation_deg(&b) - 0.5).abs() < 1e-9);

        let off = a.offset_to(&b);
        assert!((off.d_ra_deg - 0.5).abs() < 1e-9);
        assert_eq!(off.d_dec_deg, 0.0);
        assert!((off.magnitude_deg() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_separation_shrinks_with_declination() {
        let a = Equatorial::new(10.0, 60.0);
        let b = Equatorial::new(11.0, 60.0);
        // One degree of RA at dec 60 is half a degree on the sky.
        assert!((a.separation_deg(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_motion_state_settled() {
        assert!(MotionState::Idle.is_settled());
        assert!(MotionState::Tracking.is_settled());
        assert!(!MotionState::Slewing.is_settled());
        assert!(!MotionState::Settling.is_settled());
        assert!(!MotionState::Parked.is_settled());
    }

    #[test]
    fn test_exposure_request_serialization() {
        let req = ExposureRequest::new(2.5, ImageType::SkyFlat, 2);
        let json = serde_json::to_string(&req).unwrap();
        let parsed: ExposureRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
        assert!(json.contains("sky_flat"));
    }

    #[test]
    fn test_bias_request_is_zero_length() {
        let req = ExposureRequest::bias(1);
        assert_eq!(req.duration_secs, 0.0);
        assert_eq!(req.image_type, ImageType::Bias);
    }
}
