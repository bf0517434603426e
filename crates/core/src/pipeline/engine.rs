//! The observation state machine.
//!
//! One [`PipelineEngine::run`] call drives a claimed task through
//! acquisition, guiding, optional flat-fielding and the exposure loop.
//! Every stage races the shared cancel signal; whichever way a run ends,
//! cleanup runs exactly once and leaves the hardware idle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::acquisition::{AcquisitionError, AcquisitionSet};
use crate::capabilities::{
    take_exposure, Camera, CapabilityError, ExposureRequest, FilterWheel, Guiding, GuidingSetup,
    GuidingState, ImageAnalyzer, ImageHandle, ImageType, InstrumentGates, MotionStatus, Pointing,
    PointingOffset, SolarEphemeris,
};
use crate::flatfield::{
    detect_twilight, FlatFieldConfig, FlatFieldController, FlatFieldError, FlatFieldPointing,
};
use crate::metrics;
use crate::mixins::{MotionWaitError, WaitForMotion};
use crate::safety::{AbortReason, AcousticGate, AutonomyRegistry, CancelSignal};
use crate::task::{Outcome, Task, TaskKind};

use super::config::PipelineConfig;
use super::types::{PipelineRun, RunError, RunResult, Stage, StageEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The capability handles and gates of one instrument.
pub struct Instruments {
    pub pointing: Arc<dyn Pointing>,
    pub motion: Arc<dyn MotionStatus>,
    pub guiding: Arc<dyn Guiding>,
    pub camera: Arc<dyn Camera>,
    pub filter_wheel: Arc<dyn FilterWheel>,
    pub ephemeris: Arc<dyn SolarEphemeris>,
    pub gates: InstrumentGates,
}

/// Drives observation runs on one instrument.
pub struct PipelineEngine {
    instruments: Instruments,
    acquisition: AcquisitionSet,
    flat_controller: FlatFieldController,
    flat_pointing: FlatFieldPointing,
    acoustic: Arc<AcousticGate>,
    registry: Arc<AutonomyRegistry>,
    config: PipelineConfig,
    events: broadcast::Sender<StageEvent>,
}

impl PipelineEngine {
    pub fn new(
        instruments: Instruments,
        acquisition: AcquisitionSet,
        analyzer: Arc<dyn ImageAnalyzer>,
        flat_config: FlatFieldConfig,
        acoustic: Arc<AcousticGate>,
        config: PipelineConfig,
    ) -> Self {
        let flat_controller = FlatFieldController::new(
            Arc::clone(&instruments.camera),
            Arc::clone(&instruments.filter_wheel),
            analyzer,
            Arc::clone(&instruments.gates.camera),
            Arc::clone(&instruments.gates.filter_wheel),
            flat_config.clone(),
        );
        let flat_pointing = FlatFieldPointing::new(
            Arc::clone(&instruments.pointing),
            Arc::clone(&instruments.motion),
            Arc::clone(&instruments.ephemeris),
            Arc::clone(&instruments.gates.mount),
            Arc::clone(&acoustic),
            flat_config,
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        // Runs register in the gate's own registry, so a run in progress
        // always makes the gate warn before motion.
        let registry = acoustic.registry();
        Self {
            instruments,
            acquisition,
            flat_controller,
            flat_pointing,
            acoustic,
            registry,
            config,
            events,
        }
    }

    /// Stage transition stream. Lagging receivers miss events rather than
    /// slowing the run down.
    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.events.subscribe()
    }

    /// Executes one claimed task to a terminal outcome. Never panics on
    /// hardware errors; the outcome carries the failure reason instead.
    pub async fn run(&self, task: &Task, cancel: &CancelSignal) -> RunResult {
        let mut run = PipelineRun::new(&task.id);
        let _autonomy = self.registry.begin();
        info!(task_id = %task.id, run_id = %run.id, "starting pipeline run");
        metrics::PIPELINE_RUNS.inc();

        let outcome = match self.drive(&mut run, task, cancel).await {
            Ok(()) => {
                self.set_stage(&mut run, Stage::GuidingStop);
                self.cleanup(&mut run).await;
                self.set_stage(&mut run, Stage::Done);
                Outcome::Completed
            }
            Err(err) => {
                self.set_stage(&mut run, Stage::Aborting);
                self.cleanup(&mut run).await;
                let outcome = err.into_outcome();
                // A weather abort leaves the instrument idle and usable;
                // only genuine failures end in the failed stage.
                let final_stage = match outcome {
                    Outcome::Aborted { .. } => Stage::Idle,
                    _ => Stage::Failed,
                };
                self.set_stage(&mut run, final_stage);
                outcome
            }
        };

        metrics::RUN_OUTCOMES
            .with_label_values(&[outcome.label()])
            .inc();
        info!(
            task_id = %task.id,
            run_id = %run.id,
            outcome = outcome.label(),
            "pipeline run finished"
        );
        RunResult {
            run_id: run.id,
            outcome,
        }
    }

    async fn drive(
        &self,
        run: &mut PipelineRun,
        task: &Task,
        cancel: &CancelSignal,
    ) -> Result<(), RunError> {
        self.check_cancel(cancel)?;

        self.set_stage(run, Stage::Acquiring);
        self.stage_acquire(run, task, cancel).await?;

        self.set_stage(run, Stage::GuidingStart);
        self.stage_guiding_start(run, cancel).await?;

        if task.wants_flats() {
            self.set_stage(run, Stage::FlatFielding);
            match self.stage_flat_field(run, task, cancel).await {
                Ok(()) => {}
                Err(e @ (RunError::Aborted(_) | RunError::Hardware(_))) => return Err(e),
                Err(e) if task.kind == TaskKind::FlatCalibration => return Err(e),
                Err(e) => warn!(task_id = %task.id, "continuing without flats: {e}"),
            }
        }

        self.set_stage(run, Stage::Observing);
        self.stage_observe(run, task, cancel).await?;
        Ok(())
    }

    /// Points at the target and measures the pointing correction.
    ///
    /// Horizon-frame targets get blind pointing only; there is no star
    /// field to solve against a fixed alt/az position.
    async fn stage_acquire(
        &self,
        run: &mut PipelineRun,
        task: &Task,
        cancel: &CancelSignal,
    ) -> Result<(), RunError> {
        let Some(target) = task.equatorial_target() else {
            let crate::task::Target::Horizon(spot) = task.target else {
                unreachable!("non-equatorial target is horizon-frame");
            };
            self.acoustic.clear_motion().await;
            self.check_cancel(cancel)?;
            {
                let _guard = self.instruments.gates.mount.exclusive().await;
                self.guarded(cancel, self.instruments.pointing.slew_horizon(spot))
                    .await?;
            }
            self.settle(cancel).await?;
            run.pointing_offset = Some(PointingOffset::ZERO);
            return Ok(());
        };

        self.acoustic.clear_motion().await;
        self.check_cancel(cancel)?;
        {
            let _guard = self.instruments.gates.mount.exclusive().await;
            self.guarded(cancel, self.instruments.pointing.slew_to(target))
                .await?;
        }
        self.settle(cancel).await?;

        if task.acquisition.is_empty() {
            debug!(task_id = %task.id, "no acquisition variants, trusting blind pointing");
            run.pointing_offset = Some(PointingOffset::ZERO);
            return Ok(());
        }

        let offset = tokio::select! {
            _ = cancel.cancelled() => {
                // The dropped probe exposure may still be running.
                let _ = self.instruments.camera.abort_exposure().await;
                return Err(self.cancel_error(cancel));
            }
            res = self.acquisition.acquire_with_fallback(&task.acquisition, target) => {
                res.map_err(|e| match e {
                    AcquisitionError::Hardware(h) => RunError::Hardware(h),
                    AcquisitionError::NoSolution(s) => RunError::AcquisitionNotFound(s),
                })?
            }
        };

        run.pointing_offset = Some(offset);
        {
            let _guard = self.instruments.gates.mount.exclusive().await;
            self.guarded(cancel, self.instruments.pointing.offset_by(offset))
                .await?;
        }
        self.settle(cancel).await
    }

    /// Engages guiding and polls until it locks or the lock timeout fires.
    async fn stage_guiding_start(
        &self,
        run: &mut PipelineRun,
        cancel: &CancelSignal,
    ) -> Result<(), RunError> {
        self.guarded(cancel, self.instruments.guiding.engage(GuidingSetup::default()))
            .await?;
        run.guiding_engaged = true;

        let deadline = tokio::time::Instant::now()
            + Duration::from_secs_f64(self.config.guiding_lock_timeout_secs);
        loop {
            let state = self
                .guarded(cancel, self.instruments.guiding.status())
                .await?;
            match state {
                GuidingState::Locked => {
                    run.guiding_locked = true;
                    debug!(run_id = %run.id, "guiding locked");
                    return Ok(());
                }
                GuidingState::Lost => {
                    return Err(RunError::Hardware(CapabilityError::Rejected(
                        "guiding lost its reference star".to_string(),
                    )))
                }
                GuidingState::Off | GuidingState::Engaging => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(self.cancel_error(cancel)),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(RunError::GuidingTimeout(self.config.guiding_lock_timeout_secs));
                }
                _ = tokio::time::sleep(Duration::from_millis(self.config.guiding_poll_ms)) => {}
            }
        }
    }

    /// Points at the twilight sweet spot and runs the flat calibration
    /// loop; the converged exposure time lands on the run.
    async fn stage_flat_field(
        &self,
        run: &mut PipelineRun,
        task: &Task,
        cancel: &CancelSignal,
    ) -> Result<(), RunError> {
        let twilight = detect_twilight(&*self.instruments.ephemeris)
            .await
            .map_err(RunError::Hardware)?;

        self.flat_pointing
            .point(cancel)
            .await
            .map_err(|e| self.map_flat(e, cancel))?;

        let filter = task.filter.as_deref().unwrap_or("clear");
        let exposure = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = self.instruments.camera.abort_exposure().await;
                return Err(self.cancel_error(cancel));
            }
            res = self
                .flat_controller
                .calibrate(filter, task.binning, twilight, cancel) =>
            {
                res.map_err(|e| self.map_flat(e, cancel))?
            }
        };

        run.flat_exposure_secs = Some(exposure);
        Ok(())
    }

    /// The exposure loop. Each failed exposure is retried once unless the
    /// failure is a fatal communication error; a second failure ends the
    /// run.
    async fn stage_observe(
        &self,
        run: &mut PipelineRun,
        task: &Task,
        cancel: &CancelSignal,
    ) -> Result<(), RunError> {
        if let Some(filter) = &task.filter {
            let _guard = self.instruments.gates.filter_wheel.exclusive().await;
            self.guarded(cancel, self.instruments.filter_wheel.set_filter(filter))
                .await?;
        }

        let (duration_secs, image_type) = match task.kind {
            TaskKind::FlatCalibration => (
                run.flat_exposure_secs.unwrap_or(task.exposure.duration_secs),
                ImageType::SkyFlat,
            ),
            TaskKind::Science => (task.exposure.duration_secs, ImageType::Science),
        };

        for index in 0..task.exposure.count {
            self.check_cancel(cancel)?;
            let request = ExposureRequest::new(duration_secs, image_type, task.binning);

            if let Err(first) = self.expose_once(request.clone(), cancel).await {
                match &first {
                    RunError::Aborted(_) => return Err(first),
                    RunError::Hardware(h) if h.is_fatal() => return Err(first),
                    _ => {}
                }
                warn!(task_id = %task.id, index, "exposure failed, retrying once: {first}");
                self.expose_once(request, cancel)
                    .await
                    .map_err(|second| match second {
                        RunError::Aborted(_) => second,
                        other => RunError::ExposureFailed(other.to_string()),
                    })?;
            }
            debug!(task_id = %task.id, index, "exposure complete");
        }
        Ok(())
    }

    async fn expose_once(
        &self,
        request: ExposureRequest,
        cancel: &CancelSignal,
    ) -> Result<ImageHandle, RunError> {
        let _guard = self.instruments.gates.camera.exclusive().await;
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = self.instruments.camera.abort_exposure().await;
                Err(self.cancel_error(cancel))
            }
            res = take_exposure(
                &*self.instruments.camera,
                request,
                Duration::from_millis(self.config.exposure_poll_ms),
            ) => res.map_err(RunError::Hardware),
        }
    }

    /// Leaves the hardware idle. Called exactly once per run, on both the
    /// success and failure paths; individual failures are logged and
    /// swallowed so the remaining steps still happen.
    async fn cleanup(&self, run: &mut PipelineRun) {
        if let Err(e) = self.instruments.camera.abort_exposure().await {
            debug!(run_id = %run.id, "cleanup: abort_exposure failed: {e}");
        }
        // Disengage even when the engage command never confirmed: a cancel
        // can win the race after the hardware already started the loop, and
        // disengaging an off guider is a no-op.
        run.guiding_engaged = false;
        if let Err(e) = self.instruments.guiding.disengage().await {
            warn!(run_id = %run.id, "cleanup: guiding disengage failed: {e}");
        }
        if let Err(e) = self.instruments.pointing.stop_motion().await {
            warn!(run_id = %run.id, "cleanup: stop_motion failed: {e}");
        }
    }

    async fn settle(&self, cancel: &CancelSignal) -> Result<(), RunError> {
        let waiter = WaitForMotion::new(
            Arc::clone(&self.instruments.motion),
            Duration::from_millis(self.config.motion_poll_ms),
        );
        waiter
            .wait_until_settled(
                Duration::from_secs_f64(self.config.motion_settle_timeout_secs),
                cancel,
            )
            .await
            .map_err(|e| match e {
                MotionWaitError::Cancelled => self.cancel_error(cancel),
                MotionWaitError::Timeout(_) => {
                    RunError::MotionTimeout(self.config.motion_settle_timeout_secs)
                }
                MotionWaitError::MotionFault => RunError::Hardware(CapabilityError::Rejected(
                    "motion fault while settling".to_string(),
                )),
                MotionWaitError::Capability(err) => RunError::Hardware(err),
            })
    }

    /// Races a prompt hardware command against cancellation.
    async fn guarded<T>(
        &self,
        cancel: &CancelSignal,
        command: impl std::future::Future<Output = Result<T, CapabilityError>>,
    ) -> Result<T, RunError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(self.cancel_error(cancel)),
            res = command => res.map_err(RunError::Hardware),
        }
    }

    fn check_cancel(&self, cancel: &CancelSignal) -> Result<(), RunError> {
        if cancel.is_cancelled() {
            return Err(self.cancel_error(cancel));
        }
        Ok(())
    }

    fn cancel_error(&self, cancel: &CancelSignal) -> RunError {
        RunError::Aborted(cancel.reason().unwrap_or(AbortReason::Shutdown))
    }

    fn map_flat(&self, err: FlatFieldError, cancel: &CancelSignal) -> RunError {
        match err {
            FlatFieldError::Cancelled => self.cancel_error(cancel),
            FlatFieldError::Hardware(h) => RunError::Hardware(h),
            other => RunError::FlatField(other),
        }
    }

    fn set_stage(&self, run: &mut PipelineRun, stage: Stage) {
        run.stage = stage;
        debug!(run_id = %run.id, stage = stage.as_str(), "stage transition");
        let _ = self.events.send(StageEvent {
            run_id: run.id,
            task_id: run.task_id.clone(),
            stage,
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{AcquisitionConfig, AstrometricAcquisition};
    use crate::capabilities::{Equatorial, Horizon};
    use crate::task::{ExposureSpec, ObservationWindow, Target, TaskStatus};
    use crate::testing::{
        CommandLog, MockAcoustic, MockCamera, MockEphemeris, MockFilterWheel, MockGuiding,
        MockImageAnalyzer, MockPlateSolver, MockPointing,
    };

    struct Harness {
        log: CommandLog,
        pointing: Arc<MockPointing>,
        camera: Arc<MockCamera>,
        guiding: Arc<MockGuiding>,
        analyzer: MockImageAnalyzer,
        solver: Arc<MockPlateSolver>,
        config: PipelineConfig,
        flat_config: FlatFieldConfig,
        with_astrometry: bool,
    }

    impl Harness {
        fn new() -> Self {
            let log = CommandLog::new();
            Self {
                pointing: Arc::new(MockPointing::new(log.clone())),
                camera: Arc::new(MockCamera::with_log(log.clone())),
                guiding: Arc::new(MockGuiding::new(log.clone())),
                analyzer: MockImageAnalyzer::new(),
                solver: Arc::new(MockPlateSolver::new()),
                config: PipelineConfig {
                    motion_poll_ms: 1,
                    guiding_poll_ms: 1,
                    exposure_poll_ms: 1,
                    ..PipelineConfig::default()
                },
                flat_config: FlatFieldConfig {
                    exposure_poll_ms: 1,
                    motion_poll_ms: 1,
                    ..FlatFieldConfig::default()
                },
                with_astrometry: false,
                log,
            }
        }

        fn engine(&self) -> PipelineEngine {
            let gates = InstrumentGates::new("scope-1");
            let acquisition = if self.with_astrometry {
                AcquisitionSet::new(
                    vec![Arc::new(AstrometricAcquisition::new(
                        Arc::clone(&self.camera) as Arc<dyn Camera>,
                        Arc::clone(&self.solver) as _,
                        Arc::clone(&gates.camera),
                        AcquisitionConfig {
                            exposure_poll_ms: 1,
                            ..AcquisitionConfig::default()
                        },
                    ))],
                    2,
                )
            } else {
                AcquisitionSet::new(vec![], 2)
            };

            let instruments = Instruments {
                pointing: Arc::clone(&self.pointing) as _,
                motion: Arc::clone(&self.pointing) as _,
                guiding: Arc::clone(&self.guiding) as _,
                camera: Arc::clone(&self.camera) as _,
                filter_wheel: Arc::new(MockFilterWheel::new()),
                ephemeris: Arc::new(MockEphemeris::with_trend(Horizon::new(-6.0, 250.0), 0.5)),
                gates,
            };

            PipelineEngine::new(
                instruments,
                acquisition,
                Arc::new(self.analyzer.clone()),
                self.flat_config.clone(),
                AcousticGate::new(
                    Arc::new(MockAcoustic::new(self.log.clone())),
                    AutonomyRegistry::new(),
                    Duration::from_millis(1),
                ),
                self.config.clone(),
            )
        }
    }

    fn task() -> Task {
        Task {
            id: "t-1".to_string(),
            instrument: "scope-1".to_string(),
            target: Target::Equatorial(Equatorial::new(83.8, -5.4)),
            filter: Some("V".to_string()),
            binning: 1,
            exposure: ExposureSpec {
                duration_secs: 0.01,
                count: 2,
            },
            kind: TaskKind::Science,
            acquisition: vec![],
            take_flats: false,
            priority: 10,
            window: ObservationWindow {
                start: Utc::now(),
                end: Utc::now() + chrono::Duration::hours(2),
            },
            status: TaskStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_science_run_completes() {
        let harness = Harness::new();
        let engine = harness.engine();

        let result = engine.run(&task(), &CancelSignal::new()).await;
        assert_eq!(result.outcome, Outcome::Completed);

        let camera = harness.log.commands_for("camera");
        assert_eq!(
            camera
                .iter()
                .filter(|c| c.starts_with("start_exposure"))
                .count(),
            2
        );
        assert!(harness
            .log
            .commands_for("pointing")
            .iter()
            .any(|c| c.starts_with("slew_to")));
    }

    #[tokio::test]
    async fn test_cleanup_runs_exactly_once() {
        let harness = Harness::new();
        let engine = harness.engine();

        engine.run(&task(), &CancelSignal::new()).await;

        let guiding = harness.log.commands_for("guiding");
        assert_eq!(guiding.iter().filter(|c| *c == "engage").count(), 1);
        assert_eq!(guiding.iter().filter(|c| *c == "disengage").count(), 1);
        assert_eq!(
            harness
                .log
                .commands_for("pointing")
                .iter()
                .filter(|c| *c == "stop_motion")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_run_counts_as_autonomous_for_the_acoustic_gate() {
        let harness = Harness::new();
        let engine = harness.engine();

        let result = engine.run(&task(), &CancelSignal::new()).await;
        assert_eq!(result.outcome, Outcome::Completed);

        // The run registers in the same registry the gate consults, so
        // the warning fires and precedes the first mount command.
        let entries = harness.log.entries();
        let warn_idx = entries
            .iter()
            .position(|e| e.device == "acoustic")
            .expect("acoustic warning not emitted");
        let slew_idx = entries
            .iter()
            .position(|e| e.device == "pointing")
            .expect("no pointing command");
        assert!(warn_idx < slew_idx);
    }

    #[tokio::test]
    async fn test_cleanup_disengages_even_without_engage() {
        let harness = Harness::new();
        let engine = harness.engine();

        let cancel = CancelSignal::new();
        cancel.cancel(AbortReason::Shutdown);
        engine.run(&task(), &cancel).await;

        // Engage never confirmed, but the hardware may have started the
        // loop anyway; cleanup turns it off regardless.
        let guiding = harness.log.commands_for("guiding");
        assert_eq!(guiding.iter().filter(|c| *c == "engage").count(), 0);
        assert_eq!(guiding.iter().filter(|c| *c == "disengage").count(), 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_aborts_without_motion() {
        let harness = Harness::new();
        let engine = harness.engine();

        let cancel = CancelSignal::new();
        cancel.cancel(AbortReason::UnsafeWeather {
            detail: "rain".to_string(),
        });

        let result = engine.run(&task(), &cancel).await;
        assert!(matches!(result.outcome, Outcome::Aborted { .. }));

        // Only cleanup commands reach the hardware.
        let pointing = harness.log.commands_for("pointing");
        assert!(pointing.iter().all(|c| c == "stop_motion"));
        let camera = harness.log.commands_for("camera");
        assert!(camera.iter().all(|c| c == "abort_exposure"));
    }

    #[tokio::test]
    async fn test_guiding_timeout_fails_run_and_cleans_up() {
        let mut harness = Harness::new();
        harness.config.guiding_lock_timeout_secs = 0.02;
        harness.guiding.hold_status(GuidingState::Engaging);
        let engine = harness.engine();

        let result = engine.run(&task(), &CancelSignal::new()).await;
        match result.outcome {
            Outcome::Failed { reason } => assert!(reason.contains("guiding")),
            other => panic!("expected failed outcome, got {other:?}"),
        }

        let guiding = harness.log.commands_for("guiding");
        assert_eq!(guiding.iter().filter(|c| *c == "disengage").count(), 1);
    }

    #[tokio::test]
    async fn test_acquisition_applies_offset() {
        let mut harness = Harness::new();
        harness.with_astrometry = true;
        // Plate solve lands 0.2 degrees east of the target.
        harness
            .solver
            .push_solution(Some(Equatorial::new(84.0, -5.4)));
        let engine = harness.engine();

        let mut spec = task();
        spec.acquisition = vec![crate::acquisition::AcquisitionMethod::Astrometric];

        let result = engine.run(&spec, &CancelSignal::new()).await;
        assert_eq!(result.outcome, Outcome::Completed);
        assert!(harness
            .log
            .commands_for("pointing")
            .iter()
            .any(|c| c.starts_with("offset_by")));
    }

    #[tokio::test]
    async fn test_exhausted_acquisition_fails_run() {
        let mut harness = Harness::new();
        harness.with_astrometry = true;
        // No solutions scripted: every solve attempt comes back empty.
        let engine = harness.engine();

        let mut spec = task();
        spec.acquisition = vec![crate::acquisition::AcquisitionMethod::Astrometric];

        let result = engine.run(&spec, &CancelSignal::new()).await;
        match result.outcome {
            Outcome::Failed { reason } => assert!(reason.contains("acquisition")),
            other => panic!("expected failed outcome, got {other:?}"),
        }

        // The failure still routed through cleanup.
        let guiding = harness.log.commands_for("guiding");
        assert!(guiding.iter().all(|c| c != "engage"));
        assert_eq!(
            harness
                .log
                .commands_for("pointing")
                .iter()
                .filter(|c| *c == "stop_motion")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_flat_failure_is_nonfatal_for_science() {
        let mut harness = Harness::new();
        harness.flat_config.max_iterations = 2;
        // Bias, then probes stuck far below the band.
        harness
            .analyzer
            .script_counts(vec![500.0, 600.0, 600.0, 600.0]);
        let engine = harness.engine();

        let mut spec = task();
        spec.take_flats = true;

        let result = engine.run(&spec, &CancelSignal::new()).await;
        assert_eq!(result.outcome, Outcome::Completed);
    }

    #[tokio::test]
    async fn test_flat_failure_is_fatal_for_calibration_task() {
        let mut harness = Harness::new();
        harness.flat_config.max_iterations = 2;
        harness
            .analyzer
            .script_counts(vec![500.0, 600.0, 600.0, 600.0]);
        let engine = harness.engine();

        let mut spec = task();
        spec.kind = TaskKind::FlatCalibration;

        let result = engine.run(&spec, &CancelSignal::new()).await;
        assert!(matches!(result.outcome, Outcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_horizon_target_skips_acquisition() {
        let harness = Harness::new();
        let engine = harness.engine();
        let mut events = engine.subscribe();

        let mut spec = task();
        spec.target = Target::Horizon(Horizon::new(80.0, 120.0));

        let result = engine.run(&spec, &CancelSignal::new()).await;
        assert_eq!(result.outcome, Outcome::Completed);
        assert!(harness
            .log
            .commands_for("pointing")
            .iter()
            .any(|c| c.starts_with("slew_horizon")));

        let mut stages = Vec::new();
        while let Ok(event) = events.try_recv() {
            stages.push(event.stage);
        }
        assert_eq!(stages.first(), Some(&Stage::Acquiring));
        assert_eq!(stages.last(), Some(&Stage::Done));
    }

    #[tokio::test]
    async fn test_exposure_retry_then_failure() {
        let harness = Harness::new();
        // Both the first attempt and its retry fail.
        harness.camera.fail_next_exposures(2);
        let engine = harness.engine();

        let result = engine.run(&task(), &CancelSignal::new()).await;
        match result.outcome {
            Outcome::Failed { reason } => assert!(reason.contains("exposure")),
            other => panic!("expected failed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exposure_retry_succeeds() {
        let harness = Harness::new();
        harness.camera.fail_next_exposures(1);
        let engine = harness.engine();

        let result = engine.run(&task(), &CancelSignal::new()).await;
        assert_eq!(result.outcome, Outcome::Completed);
    }
}
