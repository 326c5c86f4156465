pub mod config;

// Re-export vision types for convenience
pub use goggles_vision::{
    detector, face, geometry, landmarks, render, transform, AngleMode, DetectionResult,
    FaceDetector, FaceLandmarks, GogglesTransform, Placement, YuNetDetector,
};
