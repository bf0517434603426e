//! Observation task data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acquisition::AcquisitionMethod;
use crate::capabilities::{Equatorial, Horizon};

/// Where the telescope should point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum Target {
    Equatorial(Equatorial),
    Horizon(Horizon),
}

/// What kind of observation a task is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A science observation.
    Science,
    /// A flat-field calibration run; flat convergence failure is fatal.
    FlatCalibration,
}

/// Exposure parameters for the observing stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureSpec {
    /// Single-exposure duration in seconds.
    pub duration_secs: f64,
    /// Number of exposures to take.
    pub count: u32,
}

/// The window a task must run within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub start: DateTime<Utc>,
    /// Deadline: the run must have started before this.
    pub end: DateTime<Utc>,
}

/// Lifecycle status of a task as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Claimed,
    Running,
    Completed,
    Aborted,
    Failed,
}

/// One scheduled observation request from the portal.
///
/// Immutable once claimed, except for [`Task::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Instrument this task is scheduled for.
    pub instrument: String,
    pub target: Target,
    /// Filter to observe in, if the instrument has a filter wheel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Detector binning (NxN).
    pub binning: u32,
    pub exposure: ExposureSpec,
    pub kind: TaskKind,
    /// Acquisition variants to try, in order. Empty means the scheduler
    /// trusts blind pointing (used for flats and solar targets).
    #[serde(default)]
    pub acquisition: Vec<AcquisitionMethod>,
    /// Take sky flats during this run's twilight window (non-fatal if
    /// convergence fails; flat-calibration tasks flat-field regardless).
    #[serde(default)]
    pub take_flats: bool,
    /// Higher runs first.
    pub priority: u8,
    pub window: ObservationWindow,
    pub status: TaskStatus,
}

impl Task {
    /// Whether the run should include the flat-fielding stage.
    pub fn wants_flats(&self) -> bool {
        self.kind == TaskKind::FlatCalibration || self.take_flats
    }

    /// Equatorial target, if the task has one. Horizon-frame targets skip
    /// sky-based acquisition.
    pub fn equatorial_target(&self) -> Option<Equatorial> {
        match self.target {
            Target::Equatorial(eq) => Some(eq),
            Target::Horizon(_) => None,
        }
    }
}

/// Terminal result of one run, reported back to the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Aborted { reason: String },
    Failed { reason: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Aborted { .. } => "aborted",
            Outcome::Failed { .. } => "failed",
        }
    }
}
