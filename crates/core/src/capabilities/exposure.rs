//! Exposure helper shared by acquisition, flat-fielding and observing.

use std::time::Duration;

use super::error::CapabilityError;
use super::traits::Camera;
use super::types::{ExposureRequest, ExposureStatus, ImageHandle};

/// Runs one exposure to completion: start, poll until complete, read out.
///
/// This is a cooperative wait; callers that need cancellation race it
/// against their cancel signal and actively abort the exposure afterwards.
pub async fn take_exposure(
    camera: &dyn Camera,
    request: ExposureRequest,
    poll_interval: Duration,
) -> Result<ImageHandle, CapabilityError> {
    camera.start_exposure(request).await?;

    loop {
        match camera.exposure_status().await? {
            ExposureStatus::Complete => break,
            ExposureStatus::Idle => {
                // The device dropped the exposure without completing it.
                return Err(CapabilityError::Rejected(
                    "exposure ended without completing".to_string(),
                ));
            }
            ExposureStatus::Exposing | ExposureStatus::ReadingOut => {
                tokio::time::sleep(poll_interval).await;
            }
        }
    }

    camera.read_out().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::types::ImageType;
    use crate::testing::MockCamera;

    #[tokio::test]
    async fn test_take_exposure_completes() {
        let camera = MockCamera::new();
        let image = take_exposure(
            &camera,
            ExposureRequest::new(1.5, ImageType::Science, 1),
            Duration::from_millis(1),
        )
        .await
        .unwrap();

        assert_eq!(image.exposure_secs, 1.5);
        assert_eq!(image.image_type, ImageType::Science);
    }

    #[tokio::test]
    async fn test_take_exposure_propagates_start_failure() {
        let camera = MockCamera::new();
        camera.fail_next_exposures(1);

        let result = take_exposure(
            &camera,
            ExposureRequest::new(1.0, ImageType::Science, 1),
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_err());
    }
}
