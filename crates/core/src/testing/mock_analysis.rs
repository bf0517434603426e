//! Mock image analysis: plate solver, star detector, photometry.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::acquisition::{PlateSolver, StarDetector};
use crate::capabilities::{CapabilityError, Equatorial, ImageAnalyzer, ImageHandle};

/// Mock implementation of [`PlateSolver`].
///
/// Solutions are scripted in order; an exhausted script reports "no
/// solution".
pub struct MockPlateSolver {
    solutions: Mutex<VecDeque<Option<Equatorial>>>,
}

impl Default for MockPlateSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlateSolver {
    pub fn new() -> Self {
        Self {
            solutions: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_solution(&self, solution: Option<Equatorial>) {
        self.solutions.lock().unwrap().push_back(solution);
    }
}

#[async_trait]
impl PlateSolver for MockPlateSolver {
    async fn solve(&self, _image: &ImageHandle) -> Result<Option<Equatorial>, CapabilityError> {
        Ok(self.solutions.lock().unwrap().pop_front().flatten())
    }
}

/// Mock implementation of [`StarDetector`] with scripted detections.
pub struct MockStarDetector {
    detections: Mutex<VecDeque<Option<Equatorial>>>,
    next_error: Mutex<Option<CapabilityError>>,
}

impl Default for MockStarDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStarDetector {
    pub fn new() -> Self {
        Self {
            detections: Mutex::new(VecDeque::new()),
            next_error: Mutex::new(None),
        }
    }

    pub fn push_detection(&self, detection: Option<Equatorial>) {
        self.detections.lock().unwrap().push_back(detection);
    }

    pub fn fail_next(&self, error: CapabilityError) {
        *self.next_error.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl StarDetector for MockStarDetector {
    async fn brightest_near(
        &self,
        _image: &ImageHandle,
        _near: Equatorial,
        _radius_deg: f64,
    ) -> Result<Option<Equatorial>, CapabilityError> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.detections.lock().unwrap().pop_front().flatten())
    }
}

/// Mock implementation of [`ImageAnalyzer`].
///
/// Mean counts are scripted in order; an exhausted script keeps returning
/// the last value, matching a sky whose brightness has stopped changing.
/// Clones share the script.
#[derive(Clone)]
pub struct MockImageAnalyzer {
    counts: Arc<Mutex<VecDeque<f64>>>,
    last: Arc<Mutex<f64>>,
}

impl Default for MockImageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockImageAnalyzer {
    pub fn new() -> Self {
        Self {
            counts: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(0.0)),
        }
    }

    pub fn script_counts(&self, counts: Vec<f64>) {
        self.counts.lock().unwrap().extend(counts);
    }
}

#[async_trait]
impl ImageAnalyzer for MockImageAnalyzer {
    async fn mean_counts(&self, _image: &ImageHandle) -> Result<f64, CapabilityError> {
        match self.counts.lock().unwrap().pop_front() {
            Some(value) => {
                *self.last.lock().unwrap() = value;
                Ok(value)
            }
            None => Ok(*self.last.lock().unwrap()),
        }
    }
}
