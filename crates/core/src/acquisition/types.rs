//! Types and trait seams for target acquisition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{CapabilityError, Equatorial, ImageHandle, PointingOffset};

/// Which acquisition variant to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMethod {
    /// Plate-solve an image against a catalog.
    Astrometric,
    /// Locate the brightest detected source near the expected position.
    BrightStar,
}

impl AcquisitionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionMethod::Astrometric => "astrometric",
            AcquisitionMethod::BrightStar => "bright_star",
        }
    }
}

/// Errors from an acquisition attempt.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The variant could not find a solution; retryable, possibly with a
    /// fallback variant.
    #[error("no acquisition solution: {0}")]
    NoSolution(String),

    /// Hardware failure. Not retryable within the same run.
    #[error(transparent)]
    Hardware(#[from] CapabilityError),
}

impl AcquisitionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AcquisitionError::NoSolution(_))
    }
}

/// One acquisition variant.
///
/// Contract: side-effect-free on failure. A strategy measures and returns
/// an offset; it never issues pointing commands itself, so a failed
/// attempt leaves nothing in flight.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    fn method(&self) -> AcquisitionMethod;

    /// Measures the pointing correction that would center the target.
    async fn acquire(&self, target: Equatorial) -> Result<PointingOffset, AcquisitionError>;
}

/// Astrometric plate solver. The solving algorithm lives outside the
/// orchestrator; `Ok(None)` means "no solution found" and is retryable.
#[async_trait]
pub trait PlateSolver: Send + Sync {
    /// Solves the image and returns the sky position of its center.
    async fn solve(&self, image: &ImageHandle) -> Result<Option<Equatorial>, CapabilityError>;
}

/// Bright-star detector used by the bright-star acquisition variant.
#[async_trait]
pub trait StarDetector: Send + Sync {
    /// Finds the brightest source within `radius_deg` of the expected
    /// position and returns its measured sky position.
    async fn brightest_near(
        &self,
        image: &ImageHandle,
        near: Equatorial,
        radius_deg: f64,
    ) -> Result<Option<Equatorial>, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(AcquisitionError::NoSolution("too few stars".into()).is_retryable());
        assert!(
            !AcquisitionError::Hardware(CapabilityError::Comm("camera gone".into()))
                .is_retryable()
        );
        assert!(!AcquisitionError::Hardware(CapabilityError::Timeout).is_retryable());
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&AcquisitionMethod::BrightStar).unwrap();
        assert_eq!(json, "\"bright_star\"");
        assert_eq!(AcquisitionMethod::Astrometric.label(), "astrometric");
    }
}
