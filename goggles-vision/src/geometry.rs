//! Goggles placement derived from eye and nose landmarks.

use serde::{Deserialize, Serialize};

use crate::error::PlacementError;
use crate::landmarks::{FaceLandmarks, Point};

/// Overlay width as a multiple of the inter-eye distance.
pub const WIDTH_FACTOR: f32 = 2.2;
/// Overlay height as a multiple of the eye-midpoint to nose distance.
pub const HEIGHT_FACTOR: f32 = 1.5;

/// How the tilt of the eye line is turned into a rotation angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    /// `slope * 180 / pi`. Matches the reference augmentation and diverges from
    /// the real tilt as the slope grows.
    #[default]
    Slope,
    /// True tilt `atan2(dy, dx)` in degrees.
    Atan2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GogglesGeometry {
    pub eye_midpoint: Point,
    pub width: f32,
    pub height: f32,
    pub angle_degrees: f32,
}

impl GogglesGeometry {
    /// Pixel size of the unrotated rectangle.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }
}

pub fn compute_geometry(
    landmarks: &FaceLandmarks,
    mode: AngleMode,
) -> Result<GogglesGeometry, PlacementError> {
    let left = landmarks.left_eye;
    let right = landmarks.right_eye;
    let eye_midpoint = left.midpoint(&right);

    let width = WIDTH_FACTOR * left.distance(&right);
    let height = HEIGHT_FACTOR * eye_midpoint.distance(&landmarks.nose);

    let dx = right.x - left.x;
    let dy = right.y - left.y;
    let angle_degrees = match mode {
        AngleMode::Slope => {
            if dx == 0.0 {
                return Err(PlacementError::VerticalEyeLine);
            }
            (dy / dx).to_degrees()
        }
        AngleMode::Atan2 => dy.atan2(dx).to_degrees(),
    };

    Ok(GogglesGeometry {
        eye_midpoint,
        width,
        height,
        angle_degrees,
    })
}
