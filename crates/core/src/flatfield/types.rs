//! Types for flat-field calibration.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::CapabilityError;

/// Which twilight the flat window falls in. Determines whether an
/// exposure time drifting out of bounds means "wait" or "window missed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Twilight {
    /// Evening: the sky is darkening, required exposure times grow.
    Dusk,
    /// Morning: the sky is brightening, required exposure times shrink.
    Dawn,
}

impl fmt::Display for Twilight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Twilight::Dusk => write!(f, "dusk"),
            Twilight::Dawn => write!(f, "dawn"),
        }
    }
}

/// Errors from the flat-field controller.
#[derive(Debug, Error)]
pub enum FlatFieldError {
    /// Measured counts never entered the tolerance band within the
    /// iteration cap.
    #[error("flat-field did not converge within {iterations} iterations")]
    Convergence { iterations: u32 },

    /// The required exposure time left the usable range in the direction
    /// the sky is moving; the flat window for this filter is over.
    #[error("flat-field window missed in {twilight} twilight")]
    WindowMissed { twilight: Twilight },

    /// The run was cancelled during flat-fielding.
    #[error("flat-fielding cancelled")]
    Cancelled,

    #[error(transparent)]
    Hardware(#[from] CapabilityError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twilight_display() {
        assert_eq!(Twilight::Dusk.to_string(), "dusk");
        assert_eq!(Twilight::Dawn.to_string(), "dawn");
    }

    #[test]
    fn test_error_display() {
        let err = FlatFieldError::Convergence { iterations: 10 };
        assert_eq!(
            err.to_string(),
            "flat-field did not converge within 10 iterations"
        );
        let err = FlatFieldError::WindowMissed {
            twilight: Twilight::Dawn,
        };
        assert_eq!(err.to_string(), "flat-field window missed in dawn twilight");
    }
}
