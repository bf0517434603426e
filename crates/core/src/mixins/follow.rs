//! Continuous target following for lat/lon-mounted telescopes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::capabilities::{DeviceGate, FrameConverter, Pointing, TargetTrack};
use crate::safety::CancelSignal;

/// Configuration for the follow loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowConfig {
    /// Interval between pointing re-evaluations (milliseconds).
    #[serde(default = "default_cadence")]
    pub cadence_ms: u64,

    /// Re-issue a pointing command only when the target has drifted
    /// further than this (degrees).
    #[serde(default = "default_tolerance")]
    pub tolerance_deg: f64,
}

fn default_cadence() -> u64 {
    1000
}

fn default_tolerance() -> f64 {
    0.01
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence(),
            tolerance_deg: default_tolerance(),
        }
    }
}

/// Layers continuous following onto a pointing capability.
///
/// For mounts whose frame is fixed to the site (solar telescopes), the
/// target drifts continuously; this wrapper recomputes the target position
/// at a fixed cadence and re-issues the slew whenever the pointing error
/// exceeds the tolerance. With a [`FrameConverter`] attached, the error is
/// measured in the mount's native lat/lon frame, the frame its motors and
/// tolerance actually live in. Commands go through the mount's device
/// gate, so the loop can never overlap a pipeline stage command on the
/// same mount.
pub struct Follow {
    pointing: Arc<dyn Pointing>,
    track: Arc<dyn TargetTrack>,
    converter: Option<Arc<dyn FrameConverter>>,
    gate: Arc<DeviceGate>,
    config: FollowConfig,
}

/// Handle to a running follow loop.
pub struct FollowHandle {
    stop_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl FollowHandle {
    /// Stops the follow loop and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.handle.await;
    }
}

impl Follow {
    pub fn new(
        pointing: Arc<dyn Pointing>,
        track: Arc<dyn TargetTrack>,
        gate: Arc<DeviceGate>,
        config: FollowConfig,
    ) -> Self {
        Self {
            pointing,
            track,
            converter: None,
            gate,
            config,
        }
    }

    /// Evaluates the drift tolerance in the mount's native frame. Required
    /// for lat/lon-mounted telescopes, where a degree on the sky is not a
    /// degree on the axes.
    pub fn with_converter(mut self, converter: Arc<dyn FrameConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Spawns the follow loop. It runs until stopped or the run is
    /// cancelled.
    pub fn start(&self, cancel: CancelSignal) -> FollowHandle {
        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        let pointing = Arc::clone(&self.pointing);
        let track = Arc::clone(&self.track);
        let converter = self.converter.clone();
        let gate = Arc::clone(&self.gate);
        let cadence = Duration::from_millis(self.config.cadence_ms);
        let tolerance_deg = self.config.tolerance_deg;

        let handle = tokio::spawn(async move {
            debug!("follow loop started");
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(cadence) => {
                        if let Err(e) = Self::step(
                            &*pointing,
                            &*track,
                            converter.as_deref(),
                            &gate,
                            tolerance_deg,
                        )
                        .await
                        {
                            warn!("follow step failed: {e}");
                        }
                    }
                }
            }
            debug!("follow loop stopped");
        });

        FollowHandle { stop_tx, handle }
    }

    async fn step(
        pointing: &dyn Pointing,
        track: &dyn TargetTrack,
        converter: Option<&dyn FrameConverter>,
        gate: &DeviceGate,
        tolerance_deg: f64,
    ) -> Result<(), crate::capabilities::CapabilityError> {
        let now = Utc::now();
        let target = track.position_at(now).await?;
        let current = pointing.position().await?;

        let error_deg = match converter {
            Some(conv) => {
                let target_native = conv.to_mount_frame(target, now).await?;
                let current_native = conv.to_mount_frame(current, now).await?;
                current_native.separation_deg(&target_native)
            }
            None => current.separation_deg(&target),
        };
        if error_deg <= tolerance_deg {
            return Ok(());
        }

        debug!(error_deg, "re-issuing pointing command");
        let _guard = gate.exclusive().await;
        pointing.slew_to(target).await
    }
}
