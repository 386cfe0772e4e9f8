pub mod bbox;
pub mod camera;
pub mod config;
pub mod detection;
pub mod error;
pub mod estimator;
pub mod extension;
pub mod frame;
pub mod math;
pub mod regression;
pub mod smoother;
pub mod track;

pub use camera::{CameraProperties, DistanceCalculator};
pub use config::EstimatorConfig;
pub use detection::{Detection, TrackId};
pub use error::Error;
pub use estimator::VelocityEstimator;
pub use frame::Frame;
pub use track::Track;
