//! Bright-star acquisition variant.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::capabilities::{
    take_exposure, Camera, DeviceGate, Equatorial, ExposureRequest, ImageType, PointingOffset,
};

use super::config::AcquisitionConfig;
use super::types::{AcquisitionError, AcquisitionMethod, AcquisitionStrategy, StarDetector};

/// Acquisition by centering on the brightest detected source near the
/// expected target position. Cruder than plate-solving but works in
/// fields too sparse for a catalog match.
pub struct BrightStarAcquisition {
    camera: Arc<dyn Camera>,
    detector: Arc<dyn StarDetector>,
    camera_gate: Arc<DeviceGate>,
    config: AcquisitionConfig,
}

impl BrightStarAcquisition {
    pub fn new(
        camera: Arc<dyn Camera>,
        detector: Arc<dyn StarDetector>,
        camera_gate: Arc<DeviceGate>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            camera,
            detector,
            camera_gate,
            config,
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for BrightStarAcquisition {
    fn method(&self) -> AcquisitionMethod {
        AcquisitionMethod::BrightStar
    }

    async fn acquire(&self, target: Equatorial) -> Result<PointingOffset, AcquisitionError> {
        let image = {
            let _guard = self.camera_gate.exclusive().await;
            take_exposure(
                &*self.camera,
                ExposureRequest::new(self.config.probe_exposure_secs, ImageType::Science, 1),
                Duration::from_millis(self.config.exposure_poll_ms),
            )
            .await?
        };
        debug!(image_id = %image.id, "searching for bright star");

        let found = self
            .detector
            .brightest_near(&image, target, self.config.search_radius_deg)
            .await?;

        match found {
            Some(star) => {
                let offset = star.offset_to(&target);
                info!(
                    d_ra_deg = offset.d_ra_deg,
                    d_dec_deg = offset.d_dec_deg,
                    "bright star located"
                );
                Ok(offset)
            }
            None => Err(AcquisitionError::NoSolution(format!(
                "no source within {:.2}° of expected position",
                self.config.search_radius_deg
            ))),
        }
    }
}
