//! Observation task data model.

mod types;

pub use types::{
    ExposureSpec, ObservationWindow, Outcome, Target, Task, TaskKind, TaskStatus,
};
