pub mod detector;
pub mod error;
pub mod face;
pub mod geometry;
pub mod landmarks;
pub mod model;
pub mod render;
pub mod transform;
pub mod yunet;

// Re-export commonly used types
pub use detector::{BoundingBox, DetectionResult, FaceDetector};
pub use error::PlacementError;
pub use face::{Detection, YuNetDetector};
pub use geometry::{compute_geometry, AngleMode, GogglesGeometry};
pub use landmarks::{FaceLandmarks, Point};
pub use transform::{GogglesTransform, Placement};
