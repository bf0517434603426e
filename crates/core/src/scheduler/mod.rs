//! Task scheduling against the remote portal.

mod config;
mod portal;
mod runner;
mod types;

pub use config::SchedulerConfig;
pub use portal::{Claim, ClaimToken, PortalClient, PortalError};
pub use runner::{SchedulerHandle, TaskScheduler};
pub use types::{select_next, SchedulerError};
