use serde_derive::{Deserialize, Serialize};

use crate::camera::CameraProperties;
use crate::error::Error;
use crate::regression::RansacConfig;

/// Everything needed to build a [`crate::VelocityEstimator`].
///
/// Built fresh for every run, defaults match a 21 cm ball filmed at 1080p
/// with a 15 mm lens on a full frame sensor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Moving average length in frames.
    pub smooth_window: usize,
    /// True ball diameter in meters.
    pub ball_diameter: f64,
    /// Consecutive samples per regression window.
    pub regression_points: usize,
    pub camera: CameraProperties,
    pub ransac: RansacConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            smooth_window: 5,
            ball_diameter: 0.21,
            regression_points: 30,
            camera: CameraProperties::default(),
            ransac: RansacConfig::default(),
        }
    }
}

impl EstimatorConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let positive = |name: &str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        };

        if self.smooth_window == 0 {
            return Err(Error::InvalidConfig("smooth_window must be at least 1".into()));
        }

        if self.regression_points < 2 {
            return Err(Error::InvalidConfig(format!(
                "regression_points must be at least 2, got {}",
                self.regression_points
            )));
        }

        positive("ball_diameter", self.ball_diameter)?;
        positive("camera.focal_length", self.camera.focal_length)?;
        positive("camera.sensor_width", self.camera.sensor_width)?;

        if self.camera.image_width == 0 {
            return Err(Error::InvalidConfig("camera.image_width must be positive".into()));
        }

        if self.ransac.min_samples < 2 {
            return Err(Error::InvalidConfig(format!(
                "ransac.min_samples must be at least 2, got {}",
                self.ransac.min_samples
            )));
        }

        if !(self.ransac.stop_probability > 0.0 && self.ransac.stop_probability <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "ransac.stop_probability must be in (0, 1], got {}",
                self.ransac.stop_probability
            )));
        }

        Ok(())
    }
}
