//! Composable behaviors layered onto capability implementations.
//!
//! Wrapper components over base capabilities rather than base-class
//! specialization, so any device can opt in without inheritance coupling.

mod follow;
mod wait_for_motion;

pub use follow::{Follow, FollowConfig, FollowHandle};
pub use wait_for_motion::{MotionWaitError, WaitForMotion};
