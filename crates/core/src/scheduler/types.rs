//! Task selection and scheduler errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::task::{Task, TaskStatus};

use super::portal::PortalError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Portal(#[from] PortalError),
}

/// Picks the task to claim next: pending, inside its window, highest
/// priority first, earliest deadline breaking ties.
pub fn select_next(tasks: Vec<Task>, now: DateTime<Utc>) -> Option<Task> {
    tasks
        .into_iter()
        .filter(|t| t.status == TaskStatus::Pending)
        .filter(|t| t.window.start <= now && now < t.window.end)
        .max_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.window.end.cmp(&a.window.end))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Equatorial;
    use crate::task::{ExposureSpec, ObservationWindow, Target, TaskKind};
    use chrono::Duration as ChronoDuration;

    fn task(id: &str, priority: u8, window_hours: i64) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            instrument: "scope-1".to_string(),
            target: Target::Equatorial(Equatorial::new(10.0, 0.0)),
            filter: None,
            binning: 1,
            exposure: ExposureSpec {
                duration_secs: 60.0,
                count: 1,
            },
            kind: TaskKind::Science,
            acquisition: vec![],
            take_flats: false,
            priority,
            window: ObservationWindow {
                start: now - ChronoDuration::hours(1),
                end: now + ChronoDuration::hours(window_hours),
            },
            status: TaskStatus::Pending,
        }
    }

    #[test]
    fn test_higher_priority_wins() {
        let picked = select_next(
            vec![task("low", 1, 4), task("high", 9, 4)],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(picked.id, "high");
    }

    #[test]
    fn test_earlier_deadline_breaks_priority_tie() {
        let picked = select_next(
            vec![task("late", 5, 8), task("soon", 5, 1)],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(picked.id, "soon");
    }

    #[test]
    fn test_tasks_outside_window_are_skipped() {
        let mut future = task("future", 9, 4);
        future.window.start = Utc::now() + ChronoDuration::hours(1);

        let mut expired = task("expired", 9, 4);
        expired.window.end = Utc::now() - ChronoDuration::minutes(1);

        assert!(select_next(vec![future, expired], Utc::now()).is_none());
    }

    #[test]
    fn test_non_pending_tasks_are_skipped() {
        let mut running = task("running", 9, 4);
        running.status = TaskStatus::Running;
        assert!(select_next(vec![running], Utc::now()).is_none());
    }
}
