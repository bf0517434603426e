//! Per-device command serialization.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Serializes access to one physical device.
///
/// At most one command may be in flight per device; every component that
/// issues a command to a device (pipeline stages, the `Follow` mixin)
/// must hold the device's gate for the duration of the command.
#[derive(Debug)]
pub struct DeviceGate {
    name: String,
    lock: Mutex<()>,
}

impl DeviceGate {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            lock: Mutex::new(()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for exclusive access to the device.
    ///
    /// The returned guard must be held until the command has been issued
    /// and its completion (or cancellation) observed.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        let guard = self.lock.lock().await;
        trace!(device = %self.name, "device gate acquired");
        guard
    }
}

/// The set of gates for one physical instrument.
#[derive(Debug, Clone)]
pub struct InstrumentGates {
    pub mount: Arc<DeviceGate>,
    pub camera: Arc<DeviceGate>,
    pub filter_wheel: Arc<DeviceGate>,
}

impl InstrumentGates {
    pub fn new(instrument: &str) -> Self {
        Self {
            mount: DeviceGate::new(format!("{instrument}/mount")),
            camera: DeviceGate::new(format!("{instrument}/camera")),
            filter_wheel: DeviceGate::new(format!("{instrument}/filter-wheel")),
        }
    }
}
