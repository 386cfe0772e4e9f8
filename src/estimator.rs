//! Ball speed from a track of bounding boxes.
//!
//! Every identity's box sizes are turned into a distance-from-camera series,
//! then short windows of that series are fitted with a robust regressor. The
//! steepest convincingly linear window gives the identity's speed and the
//! fastest identity gives the clip's speed.

use log::{debug, trace};

use crate::camera::DistanceCalculator;
use crate::config::EstimatorConfig;
use crate::detection::TrackId;
use crate::error::Error;
use crate::regression::{RansacRegressor, RobustRegressor};
use crate::smoother::{MovingAverageSmoother, Smoother};
use crate::track::Track;

// Calibration constants, tuned on recorded clips. Keep them exact.

/// Empirical correction of the measured speed.
pub const SPEED_CORRECTION: f64 = 1.1;
/// m/s to km/h
pub const MPS_TO_KMH: f64 = 3.6;
/// Lowest accepted speed, inclusive, in km/h.
pub const MIN_SPEED_KMH: f64 = 20.0;
/// Highest accepted speed, exclusive, in km/h.
pub const MAX_SPEED_KMH: f64 = 150.0;
/// A window must fit a line strictly better than this.
pub const MIN_R2: f64 = 0.9;

#[inline]
pub fn slope_to_velocity(slope: f64) -> f64 {
    SPEED_CORRECTION * MPS_TO_KMH * slope
}

#[inline]
pub fn is_plausible(velocity: f64, r2: f64) -> bool {
    (MIN_SPEED_KMH..MAX_SPEED_KMH).contains(&velocity) && r2 > MIN_R2
}

/// Regression result for samples `start..end` of one distance series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateWindow {
    pub start: usize,
    pub end: usize,
    /// Absolute slope in m/s
    pub slope: f64,
    pub r2: f64,
    pub performance: f64,
}

impl CandidateWindow {
    #[inline]
    pub fn velocity(&self) -> f64 {
        slope_to_velocity(self.slope)
    }

    #[inline]
    pub fn is_plausible(&self) -> bool {
        is_plausible(self.velocity(), self.r2)
    }
}

/// Steep slopes score high, poor fits are discounted by `(1 - r2)^(1/4)`.
/// A perfect fit scores `+inf`.
#[inline]
pub fn performance(slope: f64, r2: f64) -> f64 {
    slope / (1.0 - r2).max(0.0).powf(0.25)
}

pub struct VelocityEstimator<R = RansacRegressor, S = MovingAverageSmoother> {
    regression_points: usize,
    regressor: R,
    smoother: S,
    distance_calculator: DistanceCalculator,
}

impl VelocityEstimator {
    pub fn new(config: &EstimatorConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self::with_parts(
            config,
            RansacRegressor::new(config.ransac.clone()),
            MovingAverageSmoother::new(config.smooth_window),
        ))
    }
}

impl Default for VelocityEstimator {
    fn default() -> Self {
        let config = EstimatorConfig::default();

        Self::with_parts(
            &config,
            RansacRegressor::new(config.ransac.clone()),
            MovingAverageSmoother::new(config.smooth_window),
        )
    }
}

impl<R: RobustRegressor, S: Smoother> VelocityEstimator<R, S> {
    /// Uses `regressor` and `smoother` in place of the ones described by `config`.
    pub fn with_parts(config: &EstimatorConfig, regressor: R, smoother: S) -> Self {
        Self {
            regression_points: config.regression_points.max(2),
            regressor,
            smoother,
            distance_calculator: DistanceCalculator::new(config.ball_diameter, config.camera),
        }
    }

    #[inline]
    pub fn distance_calculator(&self) -> &DistanceCalculator {
        &self.distance_calculator
    }

    #[inline]
    pub fn regression_points(&self) -> usize {
        self.regression_points
    }

    /// `(times, distances)` of a track.
    ///
    /// Samples without a finite positive distance (zero-area or inverted
    /// boxes) are dropped.
    pub fn distance_series(&self, track: &Track) -> (Vec<f64>, Vec<f64>) {
        track
            .times()
            .iter()
            .zip(track.sizes())
            .map(|(&ts, &size)| (ts, self.distance_calculator.get_distance(size)))
            .filter(|(ts, dist)| ts.is_finite() && dist.is_finite() && *dist > 0.0)
            .unzip()
    }

    fn evaluate_window(
        &self,
        times: &[f64],
        distances: &[f64],
        start: usize,
        end: usize,
    ) -> Result<CandidateWindow, Error> {
        let (x, y) = (&times[start..end], &distances[start..end]);

        let fit = self.regressor.fit(x, y)?;
        let slope = fit.slope.abs();
        let r2 = fit.score(x, y);

        if !slope.is_finite() || !r2.is_finite() {
            return Err(Error::RegressionFailure(format!(
                "non-finite fit: slope {}, r2 {}",
                slope, r2
            )));
        }

        Ok(CandidateWindow {
            start,
            end,
            slope,
            r2,
            performance: performance(slope, r2),
        })
    }

    /// Best plausible window of a distance series.
    ///
    /// Scans `max(1, len - regression_points)` windows of `regression_points`
    /// samples (or the whole series when shorter). Failed fits are skipped.
    pub fn find_best_window(&self, times: &[f64], distances: &[f64]) -> Option<CandidateWindow> {
        let len = times.len().min(distances.len());
        if len < 2 {
            return None;
        }

        let count = len.saturating_sub(self.regression_points).max(1);
        let mut best: Option<CandidateWindow> = None;

        for start in 0..count {
            let end = (start + self.regression_points).min(len);

            let window = match self.evaluate_window(times, distances, start, end) {
                Ok(window) => window,
                Err(err) => {
                    trace!("window {}..{} rejected: {}", start, end, err);
                    continue;
                }
            };

            if !window.is_plausible() {
                trace!(
                    "window {}..{} rejected: {:.1} km/h, r2 {:.4}",
                    start,
                    end,
                    window.velocity(),
                    window.r2
                );
                continue;
            }

            let best_performance = best.map(|b| b.performance).unwrap_or(0.0);
            if window.performance > best_performance {
                best = Some(window);
            }
        }

        best
    }

    /// Slope of the best window, 0 when no window is plausible.
    #[inline]
    pub fn find_best_slope(&self, times: &[f64], distances: &[f64]) -> f64 {
        self.find_best_window(times, distances)
            .map(|w| w.slope)
            .unwrap_or(0.0)
    }

    /// Speed of a single identity of an already smoothed track.
    pub fn identity_velocity(&self, track: &Track, track_id: TrackId) -> Option<f64> {
        let (times, distances) = self.distance_series(&track.filter_by_track_id(track_id));

        if times.len() < 2 {
            debug!(
                "track {}: {} usable samples, skipping",
                track_id,
                times.len()
            );
            return None;
        }

        let best = self.find_best_window(&times, &distances);
        match &best {
            Some(w) => debug!(
                "track {}: {:.1} km/h from samples {}..{} (r2 {:.4})",
                track_id,
                w.velocity(),
                w.start,
                w.end,
                w.r2
            ),
            None => debug!("track {}: no plausible window", track_id),
        }

        Some(slope_to_velocity(best.map(|w| w.slope).unwrap_or(0.0)))
    }

    /// Speed in km/h of the fastest identity in `track`.
    ///
    /// `0.0` means nothing was measured with confidence; it is not an error.
    pub fn estimate_velocity(&self, track: &Track) -> f64 {
        let track = track.smooth(&self.smoother);

        let velocity = track
            .track_ids()
            .into_iter()
            .filter_map(|track_id| self.identity_velocity(&track, track_id))
            .fold(0.0, f64::max);

        debug!(
            "estimated {:.1} km/h over {} frames",
            velocity,
            track.len()
        );

        velocity
    }
}
