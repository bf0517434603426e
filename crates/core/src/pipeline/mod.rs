//! The observation pipeline: a cancellable state machine that carries a
//! claimed task from acquisition through the exposure loop.

mod config;
mod engine;
mod types;

pub use config::PipelineConfig;
pub use engine::{Instruments, PipelineEngine};
pub use types::{PipelineRun, RunError, RunResult, Stage, StageEvent};
