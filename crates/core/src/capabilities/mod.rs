//! Device capability abstraction layer.
//!
//! Device modules vary widely (mount types, solar trackers, CCD vs CMOS
//! cameras), so each is modeled as a small set of independently
//! implementable trait contracts rather than a class hierarchy. The
//! orchestrator depends only on these traits and serializes commands per
//! physical device through [`DeviceGate`].

mod error;
mod exposure;
mod gate;
mod traits;
mod types;

pub use error::CapabilityError;
pub use exposure::take_exposure;
pub use gate::{DeviceGate, InstrumentGates};
pub use traits::{
    AcousticWarning, Camera, FilterWheel, FrameConverter, Guiding, ImageAnalyzer, MotionStatus,
    Pointing, SolarEphemeris, TargetTrack, Weather,
};
pub use types::{
    Equatorial, ExposureRequest, ExposureStatus, GuidingSetup, GuidingState, Horizon, ImageHandle,
    ImageType, MotionState, MountFrame, PointingOffset, WeatherMode, WeatherSample,
};
