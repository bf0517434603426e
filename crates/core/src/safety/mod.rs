//! Safety monitoring for autonomous operation.
//!
//! A [`SafetyMonitor`] runs concurrently with every pipeline run, polling
//! the weather capability and raising the run's [`CancelSignal`] on the
//! first unsafe or stale sample. The [`AutonomyRegistry`] tracks active
//! autonomous runs so the [`AcousticGate`] can warn bystanders before any
//! unattended hardware motion.

mod config;
mod monitor;
mod registry;
mod types;

pub use config::SafetyConfig;
pub use monitor::{SafetyMonitor, SafetyWatch};
pub use registry::{AcousticGate, AutonomyGuard, AutonomyRegistry};
pub use types::{AbortReason, CancelSignal, SafetyLimits, WeatherClass};
