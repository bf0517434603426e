//! Types for the pipeline engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::capabilities::{CapabilityError, PointingOffset};
use crate::flatfield::FlatFieldError;
use crate::safety::AbortReason;
use crate::task::Outcome;

/// One phase of the observation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Acquiring,
    GuidingStart,
    FlatFielding,
    Observing,
    GuidingStop,
    Aborting,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Acquiring => "acquiring",
            Stage::GuidingStart => "guiding_start",
            Stage::FlatFielding => "flat_fielding",
            Stage::Observing => "observing",
            Stage::GuidingStop => "guiding_stop",
            Stage::Aborting => "aborting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed | Stage::Idle)
    }
}

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Hardware failure; non-retryable within the run.
    #[error(transparent)]
    Hardware(#[from] CapabilityError),

    /// All acquisition variants were exhausted without a solution.
    #[error("acquisition found no solution: {0}")]
    AcquisitionNotFound(String),

    /// Guiding never reported a lock.
    #[error("guiding did not lock within {0:.0} s")]
    GuidingTimeout(f64),

    /// A motion settle wait ran out of time. Distinct from a
    /// hardware-reported error.
    #[error("motion did not settle within {0:.0} s")]
    MotionTimeout(f64),

    /// Flat-field calibration failed.
    #[error("flat-fielding failed: {0}")]
    FlatField(#[source] FlatFieldError),

    /// An exposure failed twice.
    #[error("exposure failed after retry: {0}")]
    ExposureFailed(String),

    /// The run was cancelled, usually by the safety monitor.
    #[error("run aborted: {0}")]
    Aborted(AbortReason),
}

impl RunError {
    /// Converts a terminal error into the outcome reported to the portal.
    pub fn into_outcome(self) -> Outcome {
        match self {
            RunError::Aborted(reason) => Outcome::Aborted {
                reason: reason.to_string(),
            },
            other => Outcome::Failed {
                reason: other.to_string(),
            },
        }
    }
}

/// One execution of a task.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: Uuid,
    pub task_id: String,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    /// Pointing correction found during acquisition.
    pub pointing_offset: Option<PointingOffset>,
    /// Whether the engage command confirmed. Cleanup disengages regardless,
    /// since a cancelled engage may still have reached the hardware.
    pub guiding_engaged: bool,
    /// Whether guiding reported a lock.
    pub guiding_locked: bool,
    /// Converged flat exposure time, if the run flat-fielded.
    pub flat_exposure_secs: Option<f64>,
}

impl PipelineRun {
    pub fn new(task_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task_id.to_string(),
            stage: Stage::Idle,
            started_at: Utc::now(),
            pointing_offset: None,
            guiding_engaged: false,
            guiding_locked: false,
            flat_exposure_secs: None,
        }
    }
}

/// Emitted on every stage transition for observability consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub run_id: Uuid,
    pub task_id: String,
    pub stage: Stage,
    pub at: DateTime<Utc>,
}

/// Final result of one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: Uuid,
    pub outcome: Outcome,
}
