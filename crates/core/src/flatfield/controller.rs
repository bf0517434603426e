//! Closed-loop flat-field exposure calibration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::capabilities::{
    take_exposure, Camera, DeviceGate, ExposureRequest, FilterWheel, ImageAnalyzer, ImageType,
};
use crate::metrics;
use crate::safety::CancelSignal;

use super::config::FlatFieldConfig;
use super::model::FlatFieldModel;
use super::types::{FlatFieldError, Twilight};

/// Bounds on the per-iteration exposure correction. One anomalous probe
/// (a passing cloud, a cosmic-ray-dominated frame) must not swing the
/// exposure by more than an order of magnitude.
const MIN_CORRECTION_FACTOR: f64 = 0.1;
const MAX_CORRECTION_FACTOR: f64 = 10.0;

/// Computes, for one (filter, binning) pair, the exposure time producing
/// the target mean sky-count level.
///
/// Proportional control: probe, measure, scale by the measured-to-target
/// counts ratio, clamp, repeat until the measurement enters the tolerance
/// band or the iteration cap is hit. Probe points feed the calibration
/// model so later runs start near the answer.
pub struct FlatFieldController {
    camera: Arc<dyn Camera>,
    filter_wheel: Arc<dyn FilterWheel>,
    analyzer: Arc<dyn ImageAnalyzer>,
    camera_gate: Arc<DeviceGate>,
    filter_gate: Arc<DeviceGate>,
    config: FlatFieldConfig,
    model: Mutex<FlatFieldModel>,
}

impl FlatFieldController {
    pub fn new(
        camera: Arc<dyn Camera>,
        filter_wheel: Arc<dyn FilterWheel>,
        analyzer: Arc<dyn ImageAnalyzer>,
        camera_gate: Arc<DeviceGate>,
        filter_gate: Arc<DeviceGate>,
        config: FlatFieldConfig,
    ) -> Self {
        let model = Mutex::new(FlatFieldModel::new(config.combine_binnings));
        Self {
            camera,
            filter_wheel,
            analyzer,
            camera_gate,
            filter_gate,
            config,
            model,
        }
    }

    pub fn config(&self) -> &FlatFieldConfig {
        &self.config
    }

    /// Runs the calibration loop. Returns the converged exposure time in
    /// seconds.
    pub async fn calibrate(
        &self,
        filter: &str,
        binning: u32,
        twilight: Twilight,
        cancel: &CancelSignal,
    ) -> Result<f64, FlatFieldError> {
        info!(filter, binning, %twilight, "starting flat-field calibration");

        {
            let _guard = self.filter_gate.exclusive().await;
            self.filter_wheel.set_filter(filter).await?;
        }

        let bias = self.measure_bias(binning).await?;
        debug!(bias, "measured bias level");
        let target_signal = (self.config.target_counts - bias).max(1.0);

        let mut exposure = self.initial_exposure(filter, binning, target_signal).await;

        for iteration in 1..=self.config.max_iterations {
            if cancel.is_cancelled() {
                return Err(FlatFieldError::Cancelled);
            }

            let measured = self.probe(exposure, binning).await?;
            // A probe below min_counts is effectively dark; flooring keeps
            // the correction well-conditioned instead of exploding it.
            let signal = (measured - bias).max(self.config.min_counts);
            metrics::FLAT_PROBE_EXPOSURES.inc();
            debug!(iteration, exposure, measured, "flat probe");

            self.model
                .lock()
                .await
                .record(filter, binning, exposure, signal);

            if (signal - target_signal).abs() <= self.config.allowed_offset_frac * target_signal {
                info!(
                    filter,
                    binning, exposure, iteration, "flat-field calibration converged"
                );
                metrics::FLAT_ITERATIONS.observe(iteration as f64);
                return Ok(exposure);
            }

            let factor =
                (target_signal / signal).clamp(MIN_CORRECTION_FACTOR, MAX_CORRECTION_FACTOR);
            exposure = self.clamp_or_bail(exposure * factor, twilight)?;
        }

        warn!(filter, binning, "flat-field calibration did not converge");
        Err(FlatFieldError::Convergence {
            iterations: self.config.max_iterations,
        })
    }

    /// Starting exposure: the model's estimate if it has one, otherwise
    /// the geometric middle of the usable range.
    async fn initial_exposure(&self, filter: &str, binning: u32, target_signal: f64) -> f64 {
        let estimate = self
            .model
            .lock()
            .await
            .estimate_exposure(filter, binning, target_signal);
        match estimate {
            Some(e) => e.clamp(self.config.min_exposure_secs, self.config.max_exposure_secs),
            None => (self.config.min_exposure_secs * self.config.max_exposure_secs).sqrt(),
        }
    }

    /// Clamps the wanted exposure into the usable range. Leaving the range
    /// in the direction the sky is moving means the window is over.
    fn clamp_or_bail(&self, wanted: f64, twilight: Twilight) -> Result<f64, FlatFieldError> {
        if wanted > self.config.max_exposure_secs {
            if twilight == Twilight::Dusk {
                return Err(FlatFieldError::WindowMissed { twilight });
            }
            // Dawn: the sky is brightening towards the window.
            return Ok(self.config.max_exposure_secs);
        }
        if wanted < self.config.min_exposure_secs {
            if twilight == Twilight::Dawn {
                return Err(FlatFieldError::WindowMissed { twilight });
            }
            return Ok(self.config.min_exposure_secs);
        }
        Ok(wanted)
    }

    /// Zero-length exposure to determine the detector bias level.
    async fn measure_bias(&self, binning: u32) -> Result<f64, FlatFieldError> {
        let image = {
            let _guard = self.camera_gate.exclusive().await;
            take_exposure(
                &*self.camera,
                ExposureRequest::bias(binning),
                Duration::from_millis(self.config.exposure_poll_ms),
            )
            .await?
        };
        Ok(self.analyzer.mean_counts(&image).await?)
    }

    async fn probe(&self, exposure_secs: f64, binning: u32) -> Result<f64, FlatFieldError> {
        let image = {
            let _guard = self.camera_gate.exclusive().await;
            take_exposure(
                &*self.camera,
                ExposureRequest::new(exposure_secs, ImageType::SkyFlat, binning),
                Duration::from_millis(self.config.exposure_poll_ms),
            )
            .await?
        };
        Ok(self.analyzer.mean_counts(&image).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCamera, MockFilterWheel, MockImageAnalyzer};

    fn controller(analyzer: MockImageAnalyzer, config: FlatFieldConfig) -> FlatFieldController {
        FlatFieldController::new(
            Arc::new(MockCamera::new()),
            Arc::new(MockFilterWheel::new()),
            Arc::new(analyzer),
            DeviceGate::new("camera"),
            DeviceGate::new("filter-wheel"),
            config,
        )
    }

    fn fast_config() -> FlatFieldConfig {
        FlatFieldConfig {
            exposure_poll_ms: 1,
            motion_poll_ms: 1,
            ..FlatFieldConfig::default()
        }
    }

    #[tokio::test]
    async fn test_monotone_sequence_converges() {
        let analyzer = MockImageAnalyzer::new();
        // First reading is the bias frame, then probes walking towards
        // the 30k target.
        analyzer.script_counts(vec![500.0, 6_000.0, 18_000.0, 29_000.0]);

        let ctl = controller(analyzer, fast_config());
        let exposure = ctl
            .calibrate("V", 1, Twilight::Dawn, &CancelSignal::new())
            .await
            .unwrap();
        assert!(exposure >= ctl.config().min_exposure_secs);
        assert!(exposure <= ctl.config().max_exposure_secs);
    }

    #[tokio::test]
    async fn test_oscillating_sequence_fails_convergence() {
        let analyzer = MockImageAnalyzer::new();
        // Bias, then counts that forever alternate around the band
        // without entering it.
        let mut script = vec![500.0];
        for _ in 0..10 {
            script.push(5_000.0);
            script.push(90_000.0);
        }
        analyzer.script_counts(script);

        let config = FlatFieldConfig {
            max_iterations: 8,
            ..fast_config()
        };
        let err = controller(analyzer, config)
            .calibrate("V", 1, Twilight::Dawn, &CancelSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FlatFieldError::Convergence { iterations: 8 }));
    }

    #[tokio::test]
    async fn test_dusk_window_missed_when_sky_too_dark() {
        let analyzer = MockImageAnalyzer::new();
        // Bias, then a probe so dark the wanted exposure blows past the
        // clamp at dusk.
        analyzer.script_counts(vec![500.0, 600.0]);

        let err = controller(analyzer, fast_config())
            .calibrate("V", 1, Twilight::Dusk, &CancelSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlatFieldError::WindowMissed {
                twilight: Twilight::Dusk
            }
        ));
    }

    #[tokio::test]
    async fn test_dawn_waits_at_clamp_for_brightening_sky() {
        let analyzer = MockImageAnalyzer::new();
        // Same dark probe at dawn: the controller clamps to max and keeps
        // probing; the sky brightens into the band two probes later.
        analyzer.script_counts(vec![500.0, 600.0, 12_000.0, 28_500.0]);

        let exposure = controller(analyzer, fast_config())
            .calibrate("V", 1, Twilight::Dawn, &CancelSignal::new())
            .await
            .unwrap();
        assert!(exposure > 0.0);
    }

    #[tokio::test]
    async fn test_single_dark_probe_does_not_end_dusk_window() {
        let analyzer = MockImageAnalyzer::new();
        // Bias, a too-bright probe pushing the exposure down to the clamp,
        // then one near-dark probe (20 counts over bias, below the 100
        // min_counts floor). Uncapped, that probe would demand ~740s and
        // end the dusk window; floored and capped it walks back up and
        // the next probe converges.
        analyzer.script_counts(vec![500.0, 95_000.0, 520.0, 28_000.0]);

        let exposure = controller(analyzer, fast_config())
            .calibrate("V", 1, Twilight::Dusk, &CancelSignal::new())
            .await
            .unwrap();
        assert!(exposure > 0.0);
    }

    #[tokio::test]
    async fn test_cancelled_before_probe() {
        let analyzer = MockImageAnalyzer::new();
        analyzer.script_counts(vec![500.0]);

        let cancel = CancelSignal::new();
        cancel.cancel(crate::safety::AbortReason::Shutdown);

        let err = controller(analyzer, fast_config())
            .calibrate("V", 1, Twilight::Dusk, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FlatFieldError::Cancelled));
    }
}
