//! Mock camera capability.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::capabilities::{
    Camera, CapabilityError, ExposureRequest, ExposureStatus, ImageHandle,
};

use super::command_log::CommandLog;

const DEVICE: &str = "camera";

/// Mock implementation of [`Camera`].
///
/// Exposures complete instantly: status reports complete as soon as an
/// exposure was started, and `read_out` builds an image handle from the
/// request. Failures can be injected with
/// [`MockCamera::fail_next_exposures`].
pub struct MockCamera {
    log: CommandLog,
    request: Mutex<Option<ExposureRequest>>,
    fail_remaining: AtomicU32,
    image_counter: AtomicU32,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    pub fn new() -> Self {
        Self::with_log(CommandLog::new())
    }

    pub fn with_log(log: CommandLog) -> Self {
        Self {
            log,
            request: Mutex::new(None),
            fail_remaining: AtomicU32::new(0),
            image_counter: AtomicU32::new(0),
        }
    }

    /// The next `count` start attempts fail with a busy error.
    pub fn fail_next_exposures(&self, count: u32) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl Camera for MockCamera {
    async fn start_exposure(&self, request: ExposureRequest) -> Result<(), CapabilityError> {
        self.log.record(
            DEVICE,
            format!(
                "start_exposure({:?}, {:.3}s, bin {})",
                request.image_type, request.duration_secs, request.binning
            ),
        );

        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(CapabilityError::Busy("scripted exposure failure".to_string()));
        }

        *self.request.lock().unwrap() = Some(request);
        Ok(())
    }

    async fn exposure_status(&self) -> Result<ExposureStatus, CapabilityError> {
        Ok(if self.request.lock().unwrap().is_some() {
            ExposureStatus::Complete
        } else {
            ExposureStatus::Idle
        })
    }

    async fn abort_exposure(&self) -> Result<(), CapabilityError> {
        self.log.record(DEVICE, "abort_exposure");
        self.request.lock().unwrap().take();
        Ok(())
    }

    async fn read_out(&self) -> Result<ImageHandle, CapabilityError> {
        self.log.record(DEVICE, "read_out");
        let request = self
            .request
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| CapabilityError::Rejected("no exposure to read out".to_string()))?;

        let n = self.image_counter.fetch_add(1, Ordering::SeqCst);
        Ok(ImageHandle {
            id: format!("img-{n}"),
            taken_at: Utc::now(),
            exposure_secs: request.duration_secs,
            binning: request.binning,
            image_type: request.image_type,
        })
    }
}
