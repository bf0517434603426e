//! Astrometric (plate-solving) acquisition variant.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::capabilities::{
    take_exposure, Camera, DeviceGate, Equatorial, ExposureRequest, ImageType, PointingOffset,
};

use super::config::AcquisitionConfig;
use super::types::{AcquisitionError, AcquisitionMethod, AcquisitionStrategy, PlateSolver};

/// Acquisition by plate-solving a probe image against a catalog.
pub struct AstrometricAcquisition {
    camera: Arc<dyn Camera>,
    solver: Arc<dyn PlateSolver>,
    camera_gate: Arc<DeviceGate>,
    config: AcquisitionConfig,
}

impl AstrometricAcquisition {
    pub fn new(
        camera: Arc<dyn Camera>,
        solver: Arc<dyn PlateSolver>,
        camera_gate: Arc<DeviceGate>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            camera,
            solver,
            camera_gate,
            config,
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for AstrometricAcquisition {
    fn method(&self) -> AcquisitionMethod {
        AcquisitionMethod::Astrometric
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
        debug!(image_id = %image.id, "plate-solving probe image");

        match self.solver.solve(&image).await? {
            Some(center) => {
                let offset = center.offset_to(&target);
                info!(
                    d_ra_deg = offset.d_ra_deg,
                    d_dec_deg = offset.d_dec_deg,
                    "astrometric solution found"
                );
                Ok(offset)
            }
            None => Err(AcquisitionError::NoSolution(
                "plate solver found no solution".to_string(),
            )),
        }
    }
}
