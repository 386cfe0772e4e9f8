use serde_derive::{Deserialize, Serialize};

/// Static calibration of the camera the clip was shot with
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CameraProperties {
    /// in meters
    pub focal_length: f64,
    /// in meters
    pub sensor_width: f64,
    /// in px
    pub image_width: u32,
}

impl Default for CameraProperties {
    fn default() -> Self {
        Self {
            focal_length: 15.0 / 1000.0,
            sensor_width: 44.2 / 1000.0,
            image_width: 1920,
        }
    }
}

/// Pinhole-camera distance model for a spherical object of known diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceCalculator {
    ball_diameter: f64,
    camera: CameraProperties,
}

impl DistanceCalculator {
    pub fn new(ball_diameter: f64, camera: CameraProperties) -> Self {
        Self {
            ball_diameter,
            camera,
        }
    }

    #[inline]
    pub fn ball_diameter(&self) -> f64 {
        self.ball_diameter
    }

    #[inline]
    pub fn camera(&self) -> &CameraProperties {
        &self.camera
    }

    /// Blur and occlusion stretch a single axis, so the smaller side wins.
    #[inline]
    pub fn size_to_pixel_diameter(&self, size: (f32, f32)) -> f64 {
        f64::from(size.0.min(size.1))
    }

    /// Similar triangles: `image_w * ball_d * focal / (pixel_d * sensor_w)`.
    ///
    /// Returns `f64::INFINITY` for a zero pixel diameter; any other value is
    /// passed through unchecked.
    pub fn pixel_diameter_to_distance(&self, pixel_d: f64) -> f64 {
        if pixel_d == 0.0 {
            return f64::INFINITY;
        }

        let image_w = f64::from(self.camera.image_width);

        image_w * self.ball_diameter * self.camera.focal_length
            / (pixel_d * self.camera.sensor_width)
    }

    #[inline]
    pub fn get_distance(&self, size: (f32, f32)) -> f64 {
        self.pixel_diameter_to_distance(self.size_to_pixel_diameter(size))
    }

    /// Inverse of [`Self::pixel_diameter_to_distance`].
    pub fn distance_to_pixel_diameter(&self, distance: f64) -> f64 {
        if distance == 0.0 {
            return f64::INFINITY;
        }

        let image_w = f64::from(self.camera.image_width);

        image_w * self.ball_diameter * self.camera.focal_length
            / (distance * self.camera.sensor_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn calculator() -> DistanceCalculator {
        DistanceCalculator::new(0.21, CameraProperties::default())
    }

    #[test]
    fn test_smaller_side_is_diameter() {
        let calc = calculator();

        assert_eq!(calc.size_to_pixel_diameter((12.0, 9.0)), 9.0);
        assert_eq!(calc.size_to_pixel_diameter((7.0, 9.0)), 7.0);
    }

    #[test]
    fn test_pinhole_distance() {
        let calc = calculator();
        let expected = 1920.0 * 0.21 * 0.015 / (20.0 * 0.0442);

        assert_relative_eq!(calc.get_distance((20.0, 25.0)), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_strictly_decreasing() {
        let calc = calculator();
        let distances: Vec<f64> = (1..50)
            .map(|d| calc.pixel_diameter_to_distance(d as f64))
            .collect();

        assert!(distances.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_zero_diameter_is_infinite() {
        let calc = calculator();

        assert_eq!(calc.pixel_diameter_to_distance(0.0), f64::INFINITY);
        assert_eq!(calc.get_distance((0.0, 15.0)), f64::INFINITY);
    }

    #[test]
    fn test_pixel_diameter_round_trip() {
        let calc = calculator();
        let pixel_d = calc.distance_to_pixel_diameter(8.5);

        assert_relative_eq!(calc.pixel_diameter_to_distance(pixel_d), 8.5, epsilon = 1e-12);
    }
}
