//! Mock weather capability.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::capabilities::{CapabilityError, Weather, WeatherMode, WeatherSample};

/// Mock implementation of [`Weather`].
///
/// Returns the most recently pushed sample on every poll; a pushed sample
/// stays current until replaced, mirroring a station's cached reading.
pub struct MockWeather {
    sample: Mutex<Option<WeatherSample>>,
    next_error: Mutex<Option<CapabilityError>>,
}

impl Default for MockWeather {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWeather {
    pub fn new() -> Self {
        Self {
            sample: Mutex::new(None),
            next_error: Mutex::new(None),
        }
    }

    /// Replaces the current sample.
    pub fn push_sample(&self, sample: WeatherSample) {
        *self.sample.lock().unwrap() = Some(sample);
    }

    /// The next poll fails with this error.
    pub fn fail_next(&self, error: CapabilityError) {
        *self.next_error.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl Weather for MockWeather {
    async fn current(&self) -> Result<WeatherSample, CapabilityError> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        self.sample
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CapabilityError::Rejected("no weather sample scripted".to_string()))
    }

    fn mode(&self) -> WeatherMode {
        WeatherMode::Poll
    }
}
