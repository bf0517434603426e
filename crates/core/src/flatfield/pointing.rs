//! Pointing to the flat-field sky position.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::info;

use crate::capabilities::{
    CapabilityError, DeviceGate, Horizon, MotionStatus, Pointing, SolarEphemeris,
};
use crate::mixins::{MotionWaitError, WaitForMotion};
use crate::safety::{AcousticGate, CancelSignal};

use super::config::FlatFieldConfig;
use super::types::{FlatFieldError, Twilight};

/// Determines the current twilight from the sun's altitude trend:
/// if the sun will be lower in ten minutes, evening twilight is falling.
pub async fn detect_twilight(
    ephemeris: &dyn SolarEphemeris,
) -> Result<Twilight, CapabilityError> {
    let now = Utc::now();
    let sun_now = ephemeris.sun_horizon(now).await?;
    let sun_later = ephemeris
        .sun_horizon(now + ChronoDuration::minutes(10))
        .await?;

    Ok(if sun_later.alt_deg < sun_now.alt_deg {
        Twilight::Dusk
    } else {
        Twilight::Dawn
    })
}

/// Moves the telescope to the flat-field sweet spot before any probe
/// exposure: high altitude, anti-solar azimuth, where the twilight sky
/// gradient is smallest.
pub struct FlatFieldPointing {
    pointing: Arc<dyn Pointing>,
    motion: Arc<dyn MotionStatus>,
    ephemeris: Arc<dyn SolarEphemeris>,
    mount_gate: Arc<DeviceGate>,
    acoustic: Arc<AcousticGate>,
    config: FlatFieldConfig,
}

impl FlatFieldPointing {
    pub fn new(
        pointing: Arc<dyn Pointing>,
        motion: Arc<dyn MotionStatus>,
        ephemeris: Arc<dyn SolarEphemeris>,
        mount_gate: Arc<DeviceGate>,
        acoustic: Arc<AcousticGate>,
        config: FlatFieldConfig,
    ) -> Self {
        Self {
            pointing,
            motion,
            ephemeris,
            mount_gate,
            acoustic,
            config,
        }
    }

    /// Slews to the sweet spot and waits for settling.
    pub async fn point(&self, cancel: &CancelSignal) -> Result<Horizon, FlatFieldError> {
        let sun = self.ephemeris.sun_horizon(Utc::now()).await?;
        let spot = Horizon::new(self.config.flat_alt_deg, (sun.az_deg + 180.0).rem_euclid(360.0));
        info!(
            alt_deg = spot.alt_deg,
            az_deg = spot.az_deg,
            "moving to flat-field position"
        );

        self.acoustic.clear_motion().await;
        {
            let _guard = self.mount_gate.exclusive().await;
            self.pointing.slew_horizon(spot).await?;
        }

        let waiter = WaitForMotion::new(
            Arc::clone(&self.motion),
            Duration::from_millis(self.config.motion_poll_ms),
        );
        waiter
            .wait_until_settled(
                Duration::from_secs_f64(self.config.settle_timeout_secs),
                cancel,
            )
            .await
            .map_err(|e| match e {
                MotionWaitError::Cancelled => FlatFieldError::Cancelled,
                MotionWaitError::Timeout(_) => FlatFieldError::Hardware(CapabilityError::Timeout),
                MotionWaitError::MotionFault => FlatFieldError::Hardware(
                    CapabilityError::Rejected("motion fault while settling".to_string()),
                ),
                MotionWaitError::Capability(err) => FlatFieldError::Hardware(err),
            })?;

        Ok(spot)
    }
}
