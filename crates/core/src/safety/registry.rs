//! Registry of active autonomous runs and the acoustic motion warning.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::capabilities::AcousticWarning;

/// Process-wide count of active autonomous runs.
///
/// The acoustic warning is only required while at least one autonomous run
/// is active; concurrent runs compose through the counter instead of an
/// implicit global flag.
#[derive(Debug, Default)]
pub struct AutonomyRegistry {
    active: AtomicUsize,
}

impl AutonomyRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks the start of an autonomous run. The count drops when the
    /// returned guard is dropped.
    pub fn begin(self: &Arc<Self>) -> AutonomyGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        AutonomyGuard {
            registry: Arc::clone(self),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// RAII guard for one active autonomous run.
pub struct AutonomyGuard {
    registry: Arc<AutonomyRegistry>,
}

impl Drop for AutonomyGuard {
    fn drop(&mut self) {
        self.registry.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Emits the acoustic warning and enforces the grace period before any
/// autonomous hardware motion.
pub struct AcousticGate {
    warner: Arc<dyn AcousticWarning>,
    registry: Arc<AutonomyRegistry>,
    grace: Duration,
}

impl AcousticGate {
    pub fn new(
        warner: Arc<dyn AcousticWarning>,
        registry: Arc<AutonomyRegistry>,
        grace: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            warner,
            registry,
            grace,
        })
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// The registry this gate consults. Run owners register here so the
    /// gate and the runs they guard can never disagree on what counts as
    /// autonomous.
    pub fn registry(&self) -> Arc<AutonomyRegistry> {
        Arc::clone(&self.registry)
    }

    /// Clears an imminent autonomous motion command: warns, then waits
    /// out the grace period. No-op when no autonomous run is active
    /// (attended operation needs no warning).
    pub async fn clear_motion(&self) {
        if self.registry.active() == 0 {
            return;
        }

        info!(grace_secs = self.grace.as_secs_f64(), "acoustic warning before motion");
        if let Err(e) = self.warner.warn(self.grace).await {
            // A broken horn must not block the observation; the grace wait
            // below still applies.
            warn!("acoustic warning failed: {e}");
        }
        tokio::time::sleep(self.grace).await;
    }
}
