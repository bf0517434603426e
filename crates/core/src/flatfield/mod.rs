//! Automated sky-flat calibration.
//!
//! The one place in the orchestrator with genuine closed-loop numerical
//! control: probe exposures and proportional correction drive the mean
//! sky counts into a tolerance band around the target level.

mod config;
mod controller;
mod model;
mod pointing;
mod types;

pub use config::FlatFieldConfig;
pub use controller::FlatFieldController;
pub use model::{CalibrationCurve, CalibrationPoint, FlatFieldModel};
pub use pointing::{detect_twilight, FlatFieldPointing};
pub use types::{FlatFieldError, Twilight};
