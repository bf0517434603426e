//! Safety monitor loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capabilities::Weather;
use crate::metrics;

use super::config::SafetyConfig;
use super::types::{AbortReason, CancelSignal, WeatherClass};

/// Watches the weather capability for the lifetime of a pipeline run.
///
/// The monitor never commands hardware; on the first unsafe or stale
/// sample it raises the run's cancel signal and exits. One monitor is
/// spawned per run so monitor and run lifetimes coincide.
pub struct SafetyMonitor {
    weather: Arc<dyn Weather>,
    config: SafetyConfig,
}

/// Handle to a running safety monitor.
pub struct SafetyWatch {
    stop_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl SafetyWatch {
    /// Stops the monitor and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.handle.await;
    }
}

impl SafetyMonitor {
    pub fn new(weather: Arc<dyn Weather>, config: SafetyConfig) -> Arc<Self> {
        Arc::new(Self { weather, config })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// Spawns the monitoring loop for one run.
    pub fn watch(self: &Arc<Self>, cancel: CancelSignal) -> SafetyWatch {
        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        let monitor = Arc::clone(self);
        let interval = self.poll_interval();

        let handle = tokio::spawn(async move {
            debug!("safety monitor started");
            let mut last_sample_time = None;
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        debug!("safety monitor received stop signal");
                        break;
                    }
                    _ = cancel.cancelled() => {
                        debug!("safety monitor observed cancellation");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if monitor.check_once(&cancel, &mut last_sample_time).await {
                            break;
                        }
                    }
                }
            }
            debug!("safety monitor stopped");
        });

        SafetyWatch { stop_tx, handle }
    }

    /// Polls and classifies one sample. Returns true when the monitor is
    /// done (cancellation raised).
    async fn check_once(
        &self,
        cancel: &CancelSignal,
        last_sample_time: &mut Option<chrono::DateTime<chrono::Utc>>,
    ) -> bool {
        let sample = match self.weather.current().await {
            Ok(sample) => sample,
            Err(e) => {
                // No trustworthy data is itself an unsafe condition.
                warn!("weather capability error: {e}");
                metrics::WEATHER_CLASSIFICATIONS.with_label_values(&["unsafe"]).inc();
                cancel.cancel(AbortReason::UnsafeWeather {
                    detail: format!("weather capability error: {e}"),
                });
                return true;
            }
        };

        // Per-source timestamps must be monotonically increasing; a sample
        // that goes backwards is as untrustworthy as a stale one.
        if let Some(last) = *last_sample_time {
            if sample.time < last {
                warn!(
                    sample_time = %sample.time,
                    last_time = %last,
                    "weather sample timestamp went backwards"
                );
                metrics::WEATHER_CLASSIFICATIONS.with_label_values(&["stale"]).inc();
                cancel.cancel(AbortReason::StaleWeather {
                    age_secs: (Utc::now() - sample.time).num_seconds(),
                });
                return true;
            }
        }
        *last_sample_time = Some(sample.time);

        let class = self.config.limits.classify(&sample, Utc::now());
        metrics::WEATHER_CLASSIFICATIONS.with_label_values(&[class.label()]).inc();

        match class {
            WeatherClass::Safe => false,
            WeatherClass::Unsafe { detail } => {
                info!("weather unsafe: {detail}");
                cancel.cancel(AbortReason::UnsafeWeather { detail });
                true
            }
            WeatherClass::Stale { age_secs } => {
                info!(age_secs, "weather data stale");
                cancel.cancel(AbortReason::StaleWeather { age_secs });
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::WeatherSample;
    use crate::testing::MockWeather;

    fn fast_config() -> SafetyConfig {
        SafetyConfig {
            poll_interval_ms: 5,
            ..SafetyConfig::default()
        }
    }

    fn safe_sample() -> WeatherSample {
        WeatherSample {
            time: Utc::now(),
            cloud_cover: 0.0,
            wind_speed_ms: 2.0,
            sun_alt_deg: -40.0,
            rain: false,
        }
    }

    #[tokio::test]
    async fn test_monitor_cancels_on_unsafe_sample() {
        let weather = Arc::new(MockWeather::new());
        weather.push_sample(safe_sample());

        let monitor = SafetyMonitor::new(weather.clone(), fast_config());
        let cancel = CancelSignal::new();
        let watch = monitor.watch(cancel.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!cancel.is_cancelled());

        let mut bad = safe_sample();
        bad.rain = true;
        weather.push_sample(bad);

        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .expect("monitor did not cancel");

        assert!(matches!(
            cancel.reason(),
            Some(AbortReason::UnsafeWeather { .. })
        ));
        watch.stop().await;
    }

    #[tokio::test]
    async fn test_monitor_cancels_on_stale_sample() {
        let weather = Arc::new(MockWeather::new());
        let mut old = safe_sample();
        old.time = Utc::now() - chrono::Duration::seconds(600);
        weather.push_sample(old);

        let monitor = SafetyMonitor::new(weather, fast_config());
        let cancel = CancelSignal::new();
        let watch = monitor.watch(cancel.clone());

        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .expect("monitor did not cancel");
        assert!(matches!(
            cancel.reason(),
            Some(AbortReason::StaleWeather { .. })
        ));
        watch.stop().await;
    }

    #[tokio::test]
    async fn test_monitor_cancels_on_weather_error() {
        let weather = Arc::new(MockWeather::new());
        weather.fail_next(crate::capabilities::CapabilityError::Comm(
            "station offline".to_string(),
        ));

        let monitor = SafetyMonitor::new(weather, fast_config());
        let cancel = CancelSignal::new();
        let watch = monitor.watch(cancel.clone());

        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .expect("monitor did not cancel");
        watch.stop().await;
    }

    #[tokio::test]
    async fn test_monitor_stops_cleanly_while_safe() {
        let weather = Arc::new(MockWeather::new());
        weather.push_sample(safe_sample());

        let monitor = SafetyMonitor::new(weather, fast_config());
        let cancel = CancelSignal::new();
        let watch = monitor.watch(cancel.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        watch.stop().await;
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_monitor_flags_backwards_timestamp() {
        let weather = Arc::new(MockWeather::new());
        let monitor = SafetyMonitor::new(weather.clone(), fast_config());
        let cancel = CancelSignal::new();

        let mut last = None;
        let first = safe_sample();
        weather.push_sample(first.clone());
        assert!(!monitor.check_once(&cancel, &mut last).await);

        let mut older = safe_sample();
        older.time = first.time - chrono::Duration::seconds(30);
        weather.push_sample(older);
        assert!(monitor.check_once(&cancel, &mut last).await);
        assert!(matches!(
            cancel.reason(),
            Some(AbortReason::StaleWeather { .. })
        ));
    }
}
