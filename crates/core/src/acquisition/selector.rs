//! Variant selection and bounded fallback.

use std::sync::Arc;

use tracing::{info, warn};

use crate::capabilities::{Equatorial, PointingOffset};
use crate::metrics;

use super::types::{AcquisitionError, AcquisitionMethod, AcquisitionStrategy};

/// The set of acquisition variants available on one instrument.
///
/// The pipeline engine asks for a method order per task; each variant gets
/// a bounded number of attempts, `NoSolution` falls through to the next
/// variant, hardware errors abort immediately.
pub struct AcquisitionSet {
    strategies: Vec<Arc<dyn AcquisitionStrategy>>,
    attempts_per_method: u32,
}

impl AcquisitionSet {
    pub fn new(strategies: Vec<Arc<dyn AcquisitionStrategy>>, attempts_per_method: u32) -> Self {
        Self {
            strategies,
            attempts_per_method: attempts_per_method.max(1),
        }
    }

    fn find(&self, method: AcquisitionMethod) -> Option<&Arc<dyn AcquisitionStrategy>> {
        self.strategies.iter().find(|s| s.method() == method)
    }

    /// Runs acquisition through the ordered variant list.
    pub async fn acquire_with_fallback(
        &self,
        order: &[AcquisitionMethod],
        target: Equatorial,
    ) -> Result<PointingOffset, AcquisitionError> {
        let mut last_failure = AcquisitionError::NoSolution(
            "no acquisition variant configured for this task".to_string(),
        );

        for method in order {
            let Some(strategy) = self.find(*method) else {
                warn!(method = method.label(), "acquisition variant not available");
                continue;
            };

            for attempt in 1..=self.attempts_per_method {
                match strategy.acquire(target).await {
                    Ok(offset) => {
                        metrics::ACQUISITION_ATTEMPTS
                            .with_label_values(&[method.label(), "success"])
                            .inc();
                        info!(
                            method = method.label(),
                            attempt,
                            offset_deg = offset.magnitude_deg(),
                            "acquisition succeeded"
                        );
                        return Ok(offset);
                    }
                    Err(e) if e.is_retryable() => {
                        metrics::ACQUISITION_ATTEMPTS
                            .with_label_values(&[method.label(), "no_solution"])
                            .inc();
                        warn!(method = method.label(), attempt, "acquisition attempt failed: {e}");
                        last_failure = e;
                    }
                    Err(e) => {
                        metrics::ACQUISITION_ATTEMPTS
                            .with_label_values(&[method.label(), "hardware_error"])
                            .inc();
                        return Err(e);
                    }
                }
            }
        }

        Err(last_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted strategy: fails with NoSolution for the first
    /// `failures` calls, then succeeds.
    struct ScriptedStrategy {
        method: AcquisitionMethod,
        failures: u32,
        calls: AtomicU32,
        hardware_error: bool,
    }

    impl ScriptedStrategy {
        fn failing_then_ok(method: AcquisitionMethod, failures: u32) -> Arc<Self> {
            Arc::new(Self {
                method,
                failures,
                calls: AtomicU32::new(0),
                hardware_error: false,
            })
        }

        fn hardware_broken(method: AcquisitionMethod) -> Arc<Self> {
            Arc::new(Self {
                method,
                failures: 0,
                calls: AtomicU32::new(0),
                hardware_error: true,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AcquisitionStrategy for ScriptedStrategy {
        fn method(&self) -> AcquisitionMethod {
            self.method
        }

        async fn acquire(&self, _: Equatorial) -> Result<PointingOffset, AcquisitionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hardware_error {
                return Err(AcquisitionError::Hardware(
                    crate::capabilities::CapabilityError::Comm("probe camera gone".into()),
                ));
            }
            if call < self.failures {
                Err(AcquisitionError::NoSolution("synthetic miss".into()))
            } else {
                Ok(PointingOffset {
                    d_ra_deg: 0.01,
                    d_dec_deg: 0.0,
                })
            }
        }
    }

    const ORDER: [AcquisitionMethod; 2] =
        [AcquisitionMethod::Astrometric, AcquisitionMethod::BrightStar];

    #[tokio::test]
    async fn test_fallback_to_second_variant() {
        let astro = ScriptedStrategy::failing_then_ok(AcquisitionMethod::Astrometric, 10);
        let bright = ScriptedStrategy::failing_then_ok(AcquisitionMethod::BrightStar, 0);
        let set = AcquisitionSet::new(vec![astro.clone(), bright.clone()], 2);

        let offset = set
            .acquire_with_fallback(&ORDER, Equatorial::new(10.0, 0.0))
            .await
            .unwrap();
        assert!(offset.magnitude_deg() > 0.0);
        assert_eq!(astro.calls(), 2);
        assert_eq!(bright.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_variants_exhausted() {
        let astro = ScriptedStrategy::failing_then_ok(AcquisitionMethod::Astrometric, 10);
        let bright = ScriptedStrategy::failing_then_ok(AcquisitionMethod::BrightStar, 10);
        let set = AcquisitionSet::new(vec![astro, bright], 2);

        let err = set
            .acquire_with_fallback(&ORDER, Equatorial::new(10.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::NoSolution(_)));
    }

    #[tokio::test]
    async fn test_hardware_error_stops_fallback() {
        let astro = ScriptedStrategy::hardware_broken(AcquisitionMethod::Astrometric);
        let bright = ScriptedStrategy::failing_then_ok(AcquisitionMethod::BrightStar, 0);
        let set = AcquisitionSet::new(vec![astro, bright.clone()], 2);

        let err = set
            .acquire_with_fallback(&ORDER, Equatorial::new(10.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Hardware(_)));
        // The second variant was never tried.
        assert_eq!(bright.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_order_is_no_solution() {
        let set = AcquisitionSet::new(vec![], 2);
        let err = set
            .acquire_with_fallback(&[], Equatorial::new(10.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::NoSolution(_)));
    }
}
