pub mod acquisition;
pub mod capabilities;
pub mod config;
pub mod flatfield;
pub mod metrics;
pub mod mixins;
pub mod pipeline;
pub mod safety;
pub mod scheduler;
pub mod task;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use pipeline::{Instruments, PipelineEngine, RunResult, Stage};
pub use safety::{AbortReason, CancelSignal, SafetyMonitor};
pub use scheduler::{PortalClient, SchedulerHandle, TaskScheduler};
pub use task::{Outcome, Task};
