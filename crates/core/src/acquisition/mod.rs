//! Target acquisition: correcting initial telescope pointing against the
//! true target position.
//!
//! Two variants sit behind one strategy interface; the pipeline engine
//! picks an order per task and falls back on bounded consecutive
//! failures. The solving/detection algorithms themselves are external
//! collaborators behind the [`PlateSolver`] and [`StarDetector`] seams.

mod astrometric;
mod bright_star;
mod config;
mod selector;
mod types;

pub use astrometric::AstrometricAcquisition;
pub use bright_star::BrightStarAcquisition;
pub use config::AcquisitionConfig;
pub use selector::AcquisitionSet;
pub use types::{
    AcquisitionError, AcquisitionMethod, AcquisitionStrategy, PlateSolver, StarDetector,
};
