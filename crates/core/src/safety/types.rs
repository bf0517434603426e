//! Types for the safety monitor.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::capabilities::WeatherSample;

/// Why a run was told to abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// A weather sample violated the configured safety limits.
    UnsafeWeather { detail: String },
    /// Weather data is too old to trust.
    StaleWeather { age_secs: i64 },
    /// Orchestrator shutdown requested.
    Shutdown,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::UnsafeWeather { detail } => write!(f, "unsafe weather: {detail}"),
            AbortReason::StaleWeather { age_secs } => {
                write!(f, "stale weather data ({age_secs}s old)")
            }
            AbortReason::Shutdown => write!(f, "shutdown requested"),
        }
    }
}

/// Classification of one weather sample.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherClass {
    Safe,
    Unsafe { detail: String },
    Stale { age_secs: i64 },
}

impl WeatherClass {
    pub fn label(&self) -> &'static str {
        match self {
            WeatherClass::Safe => "safe",
            WeatherClass::Unsafe { .. } => "unsafe",
            WeatherClass::Stale { .. } => "stale",
        }
    }
}

/// Safety limits applied to each weather sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Maximum fractional cloud cover.
    #[serde(default = "default_max_cloud_cover")]
    pub max_cloud_cover: f64,

    /// Maximum wind speed in m/s.
    #[serde(default = "default_max_wind")]
    pub max_wind_speed_ms: f64,

    /// Maximum sun altitude in degrees; above this the sky is too bright
    /// for autonomous operation (solar instruments override this).
    #[serde(default = "default_max_sun_alt")]
    pub max_sun_alt_deg: f64,

    /// A sample older than this is itself an unsafe condition.
    #[serde(default = "default_max_sample_age")]
    pub max_sample_age_secs: i64,
}

fn default_max_cloud_cover() -> f64 {
    0.5
}

fn default_max_wind() -> f64 {
    15.0
}

fn default_max_sun_alt() -> f64 {
    -10.0
}

fn default_max_sample_age() -> i64 {
    60
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_cloud_cover: default_max_cloud_cover(),
            max_wind_speed_ms: default_max_wind(),
            max_sun_alt_deg: default_max_sun_alt(),
            max_sample_age_secs: default_max_sample_age(),
        }
    }
}

impl SafetyLimits {
    /// Classifies a sample against the limits. Staleness wins over content:
    /// a reading we cannot trust is unsafe no matter what it says.
    pub fn classify(
        &self,
        sample: &WeatherSample,
        now: chrono::DateTime<chrono::Utc>,
    ) -> WeatherClass {
        let age_secs = (now - sample.time).num_seconds();
        if age_secs > self.max_sample_age_secs {
            return WeatherClass::Stale { age_secs };
        }

        if sample.rain {
            return WeatherClass::Unsafe {
                detail: "rain sensor triggered".to_string(),
            };
        }
        if sample.cloud_cover > self.max_cloud_cover {
            return WeatherClass::Unsafe {
                detail: format!(
                    "cloud cover {:.2} above limit {:.2}",
                    sample.cloud_cover, self.max_cloud_cover
                ),
            };
        }
        if sample.wind_speed_ms > self.max_wind_speed_ms {
            return WeatherClass::Unsafe {
                detail: format!(
                    "wind {:.1} m/s above limit {:.1} m/s",
                    sample.wind_speed_ms, self.max_wind_speed_ms
                ),
            };
        }
        if sample.sun_alt_deg > self.max_sun_alt_deg {
            return WeatherClass::Unsafe {
                detail: format!(
                    "sun altitude {:.1}° above limit {:.1}°",
                    sample.sun_alt_deg, self.max_sun_alt_deg
                ),
            };
        }

        WeatherClass::Safe
    }
}

struct CancelInner {
    cancelled: AtomicBool,
    reason: Mutex<Option<AbortReason>>,
    notify: Notify,
}

/// The single cancellation flag shared between the safety monitor and the
/// pipeline engine, plus a one-shot abort reason.
///
/// Cancelling is idempotent: only the first reason is kept, repeated
/// cancels are no-ops.
#[derive(Clone)]
pub struct CancelSignal {
    inner: Arc<CancelInner>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                reason: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// Raises the cancellation flag with the given reason.
    pub fn cancel(&self, reason: AbortReason) {
        {
            let mut slot = self.inner.reason.lock().unwrap();
            if slot.is_some() {
                return;
            }
            *slot = Some(reason);
        }
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// The reason set by the first cancel, if any.
    pub fn reason(&self) -> Option<AbortReason> {
        self.inner.reason.lock().unwrap().clone()
    }

    /// Suspends until the signal is cancelled. Returns immediately if it
    /// already is.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register with the notifier before reading the flag; a waiter
        // that is not yet enabled misses `notify_waiters`, so checking
        // first would leave a window where a cancel is never observed.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
