//! Mock pointing capability.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::capabilities::{
    CapabilityError, Equatorial, Horizon, MotionState, MotionStatus, Pointing, PointingOffset,
};

use super::command_log::CommandLog;

const DEVICE: &str = "pointing";

/// Mock implementation of [`Pointing`] and [`MotionStatus`].
///
/// Slews complete instantly: `slew_to` updates the reported position and
/// the motion state defaults to idle. Settling sequences can be scripted
/// with [`MockPointing::push_motion_states`], or pinned with
/// [`MockPointing::hold_motion_state`].
pub struct MockPointing {
    log: CommandLog,
    position: Mutex<Equatorial>,
    states: Mutex<VecDeque<MotionState>>,
    held: Mutex<Option<MotionState>>,
}

impl MockPointing {
    pub fn new(log: CommandLog) -> Self {
        Self {
            log,
            position: Mutex::new(Equatorial::new(0.0, 0.0)),
            states: Mutex::new(VecDeque::new()),
            held: Mutex::new(None),
        }
    }

    /// A mock with its own private log, for tests that only care about
    /// motion status.
    pub fn new_detached() -> Self {
        Self::new(CommandLog::new())
    }

    pub fn set_position(&self, position: Equatorial) {
        *self.position.lock().unwrap() = position;
    }

    /// Scripts the next motion states, consumed one per poll. Once the
    /// script runs out the state falls back to idle.
    pub fn push_motion_states(&self, states: Vec<MotionState>) {
        self.states.lock().unwrap().extend(states);
    }

    /// Pins the motion state; takes precedence over any scripted states.
    pub fn hold_motion_state(&self, state: MotionState) {
        *self.held.lock().unwrap() = Some(state);
    }
}

#[async_trait]
impl Pointing for MockPointing {
    async fn slew_to(&self, target: Equatorial) -> Result<(), CapabilityError> {
        self.log.record(
            DEVICE,
            format!("slew_to({:.4}, {:.4})", target.ra_deg, target.dec_deg),
        );
        *self.position.lock().unwrap() = target;
        Ok(())
    }

    async fn slew_horizon(&self, target: Horizon) -> Result<(), CapabilityError> {
        self.log.record(
            DEVICE,
            format!("slew_horizon({:.4}, {:.4})", target.alt_deg, target.az_deg),
        );
        Ok(())
    }

    async fn offset_by(&self, offset: PointingOffset) -> Result<(), CapabilityError> {
        self.log.record(
            DEVICE,
            format!("offset_by({:.4}, {:.4})", offset.d_ra_deg, offset.d_dec_deg),
        );
        let mut position = self.position.lock().unwrap();
        position.ra_deg += offset.d_ra_deg;
        position.dec_deg += offset.d_dec_deg;
        Ok(())
    }

    async fn stop_motion(&self) -> Result<(), CapabilityError> {
        self.log.record(DEVICE, "stop_motion");
        Ok(())
    }

    async fn position(&self) -> Result<Equatorial, CapabilityError> {
        Ok(*self.position.lock().unwrap())
    }
}

#[async_trait]
impl MotionStatus for MockPointing {
    async fn motion_state(&self) -> Result<MotionState, CapabilityError> {
        if let Some(held) = *self.held.lock().unwrap() {
            return Ok(held);
        }
        Ok(self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MotionState::Idle))
    }
}
