//! Per-filter, per-binning exposure calibration curves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One measured probe point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub exposure_secs: f64,
    /// Bias-corrected mean counts produced by that exposure.
    pub counts: f64,
}

/// The measured exposure-vs-counts relationship for one curve key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub points: Vec<CalibrationPoint>,
}

impl CalibrationCurve {
    fn push(&mut self, point: CalibrationPoint) {
        self.points.push(point);
    }

    /// Proportional estimate from the recorded point whose counts are
    /// closest to the requested target.
    fn estimate(&self, target_counts: f64) -> Option<f64> {
        let nearest = self.points.iter().min_by(|a, b| {
            let da = (a.counts - target_counts).abs();
            let db = (b.counts - target_counts).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if nearest.counts <= 0.0 {
            return None;
        }
        Some(nearest.exposure_secs * target_counts / nearest.counts)
    }
}

/// Maps measured sky counts to a target exposure time per (filter,
/// binning) pair.
///
/// With `combine_binnings` one curve per filter is kept in
/// reference-binning units and scaled by binning area on the way in and
/// out. Without it, binnings that do not scale linearly get fully
/// independent curves; no scaling relationship is assumed between them.
#[derive(Debug, Clone)]
pub struct FlatFieldModel {
    combine_binnings: bool,
    curves: HashMap<(String, u32), CalibrationCurve>,
}

const REFERENCE_BINNING: u32 = 1;

impl FlatFieldModel {
    pub fn new(combine_binnings: bool) -> Self {
        Self {
            combine_binnings,
            curves: HashMap::new(),
        }
    }

    pub fn combine_binnings(&self) -> bool {
        self.combine_binnings
    }

    fn key(&self, filter: &str, binning: u32) -> (String, u32) {
        if self.combine_binnings {
            (filter.to_string(), REFERENCE_BINNING)
        } else {
            (filter.to_string(), binning)
        }
    }

    /// Binning-area factor relative to the reference binning.
    fn area_factor(binning: u32) -> f64 {
        let b = binning.max(1) as f64;
        b * b
    }

    /// Records a measured probe point.
    pub fn record(&mut self, filter: &str, binning: u32, exposure_secs: f64, counts: f64) {
        let exposure = if self.combine_binnings {
            // Normalize to reference binning: an NxN-binned pixel
            // collects N² times faster.
            exposure_secs * Self::area_factor(binning)
        } else {
            exposure_secs
        };
        self.curves
            .entry(self.key(filter, binning))
            .or_default()
            .push(CalibrationPoint {
                exposure_secs: exposure,
                counts,
            });
    }

    /// Estimated exposure producing `target_counts`, if this (filter,
    /// binning) has calibration data.
    pub fn estimate_exposure(
        &self,
        filter: &str,
        binning: u32,
        target_counts: f64,
    ) -> Option<f64> {
        let curve = self.curves.get(&self.key(filter, binning))?;
        let exposure = curve.estimate(target_counts)?;
        if self.combine_binnings {
            Some(exposure / Self::area_factor(binning))
        } else {
            Some(exposure)
        }
    }

    /// Number of independent curves held.
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }
}
