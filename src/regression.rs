//! Outlier tolerant line fitting.
//!
//! The default strategy is RANSAC with a seeded generator, so the same
//! input always produces the same model.

use nalgebra as na;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::math;

/// Line `y = slope * x + intercept` produced by a regressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points the final model was fitted on
    pub inliers: usize,
}

impl LineFit {
    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// R² of the model over every given point, outliers included.
    pub fn score(&self, x: &[f64], y: &[f64]) -> f64 {
        let y_pred: Vec<f64> = x.iter().map(|&x| self.predict(x)).collect();

        math::r2_score(y, &y_pred)
    }
}

pub trait RobustRegressor {
    /// Must be deterministic for a fixed configuration.
    fn fit(&self, x: &[f64], y: &[f64]) -> Result<LineFit, Error>;
}

/// Configuration for the RANSAC line regressor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RansacConfig {
    /// Points drawn per trial.
    pub min_samples: usize,
    /// Upper bound on the number of trials.
    pub max_trials: usize,
    /// Probability that at least one trial draws only inliers.
    pub stop_probability: f64,
    /// Max absolute residual of an inlier, median absolute deviation of `y` when unset.
    pub residual_threshold: Option<f64>,
    /// Seed of the sampling generator, reset on every fit.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            min_samples: 2,
            max_trials: 100,
            stop_probability: 0.7,
            residual_threshold: None,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RansacRegressor {
    config: RansacConfig,
}

struct Consensus {
    inliers: Vec<usize>,
    score: f64,
}

impl Consensus {
    /// More inliers win, an equal count wins unless it scores lower.
    #[inline]
    fn replaced_by(&self, n_inliers: usize, score: f64) -> bool {
        n_inliers > self.inliers.len() || (n_inliers == self.inliers.len() && score >= self.score)
    }
}

impl RansacRegressor {
    pub fn new(config: RansacConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &RansacConfig {
        &self.config
    }

    fn fit_subset(x: &[f64], y: &[f64], idx: &[usize]) -> Option<LineFit> {
        let xs = na::DVector::from_iterator(idx.len(), idx.iter().map(|&i| x[i]));
        let ys = na::DVector::from_iterator(idx.len(), idx.iter().map(|&i| y[i]));

        let params = math::linear_ls(&xs, &ys)?;

        Some(LineFit {
            slope: params[0],
            intercept: params[1],
            inliers: idx.len(),
        })
    }
}

impl RobustRegressor for RansacRegressor {
    fn fit(&self, x: &[f64], y: &[f64]) -> Result<LineFit, Error> {
        let n = x.len();
        let min_samples = self.config.min_samples.max(2);

        if n != y.len() {
            return Err(Error::DegenerateInput(format!(
                "x and y differ in length ({} != {})",
                n,
                y.len()
            )));
        }

        if n < min_samples {
            return Err(Error::DegenerateInput(format!(
                "{} points, at least {} required",
                n, min_samples
            )));
        }

        let threshold = match self.config.residual_threshold {
            Some(threshold) => threshold,
            None => math::median_absolute_deviation(y)
                .ok_or_else(|| Error::DegenerateInput("empty y".into()))?,
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<Consensus> = None;
        let mut max_trials = self.config.max_trials;
        let mut trials = 0;

        while trials < max_trials {
            trials += 1;

            let sample = rand::seq::index::sample(&mut rng, n, min_samples).into_vec();
            let model = match Self::fit_subset(x, y, &sample) {
                Some(model) => model,
                None => continue,
            };

            let inliers: Vec<usize> = (0..n)
                .filter(|&i| (y[i] - model.predict(x[i])).abs() <= threshold)
                .collect();

            if inliers.is_empty() {
                continue;
            }

            let best_count = best.as_ref().map(|b| b.inliers.len()).unwrap_or(0);
            if inliers.len() < best_count {
                continue;
            }

            let xs: Vec<f64> = inliers.iter().map(|&i| x[i]).collect();
            let ys: Vec<f64> = inliers.iter().map(|&i| y[i]).collect();
            let score = model.score(&xs, &ys);

            if let Some(b) = &best {
                if !b.replaced_by(inliers.len(), score) {
                    continue;
                }
            }

            max_trials = max_trials.min(dynamic_max_trials(
                inliers.len(),
                n,
                min_samples,
                self.config.stop_probability,
            ));

            let all_inliers = inliers.len() == n;
            best = Some(Consensus { inliers, score });

            if all_inliers {
                break;
            }
        }

        let consensus = best.ok_or_else(|| {
            Error::RegressionFailure(format!("no consensus set after {} trials", trials))
        })?;

        Self::fit_subset(x, y, &consensus.inliers).ok_or_else(|| {
            Error::RegressionFailure(format!(
                "singular refit on {} inliers",
                consensus.inliers.len()
            ))
        })
    }
}

/// Trials needed to draw an all-inlier sample with `probability`.
fn dynamic_max_trials(
    n_inliers: usize,
    n_samples: usize,
    min_samples: usize,
    probability: f64,
) -> usize {
    let inlier_ratio = n_inliers as f64 / n_samples as f64;
    let nom = (1.0 - probability).max(f64::EPSILON);
    let denom = (1.0 - inlier_ratio.powi(min_samples as i32)).max(f64::EPSILON);

    if nom == 1.0 {
        return 0;
    }

    if denom == 1.0 {
        return usize::MAX;
    }

    (nom.ln() / denom.ln()).ceil().abs() as usize
}
