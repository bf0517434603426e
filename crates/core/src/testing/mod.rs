//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of every capability trait,
//! allowing comprehensive testing without telescope hardware.
//!
//! # Example
//!
//! ```rust,ignore
//! use auriga_core::testing::{CommandLog, MockCamera, MockPointing};
//!
//! let log = CommandLog::new();
//! let pointing = MockPointing::new(log.clone());
//! let camera = MockCamera::with_log(log.clone());
//!
//! // Drive the pipeline, then assert on the recorded commands...
//! assert!(log.commands_for("pointing").is_empty());
//! ```

mod command_log;
mod mock_acoustic;
mod mock_analysis;
mod mock_camera;
mod mock_filter_wheel;
mod mock_guiding;
mod mock_pointing;
mod mock_portal;
mod mock_sky;
mod mock_weather;

pub use command_log::{CommandEntry, CommandLog};
pub use mock_acoustic::MockAcoustic;
pub use mock_analysis::{MockImageAnalyzer, MockPlateSolver, MockStarDetector};
pub use mock_camera::MockCamera;
pub use mock_filter_wheel::MockFilterWheel;
pub use mock_guiding::MockGuiding;
pub use mock_pointing::MockPointing;
pub use mock_portal::MockPortal;
pub use mock_sky::{MockEphemeris, MockFrameConverter, MockTargetTrack};
pub use mock_weather::MockWeather;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration as ChronoDuration, Utc};

    use crate::capabilities::{Equatorial, WeatherSample};
    use crate::task::{ExposureSpec, ObservationWindow, Target, Task, TaskKind, TaskStatus};

    /// Create a science task with reasonable defaults, windowed around now.
    pub fn science_task(id: &str, instrument: &str) -> Task {
        Task {
            id: id.to_string(),
            instrument: instrument.to_string(),
            target: Target::Equatorial(Equatorial::new(83.8, -5.4)),
            filter: Some("V".to_string()),
            binning: 1,
            exposure: ExposureSpec {
                duration_secs: 0.01,
                count: 1,
            },
            kind: TaskKind::Science,
            acquisition: vec![],
            take_flats: false,
            priority: 5,
            window: ObservationWindow {
                start: Utc::now() - ChronoDuration::hours(1),
                end: Utc::now() + ChronoDuration::hours(1),
            },
            status: TaskStatus::Pending,
        }
    }

    /// Create a weather sample well inside the default safety limits.
    pub fn safe_weather() -> WeatherSample {
        WeatherSample {
            time: Utc::now(),
            cloud_cover: 0.1,
            wind_speed_ms: 3.0,
            sun_alt_deg: -30.0,
            rain: false,
        }
    }
}
