use anyhow::{Context, Result};
use image::RgbaImage;
use serde::Serialize;

use crate::detector::{BoundingBox, DetectionResult, FaceDetector};
use crate::error::PlacementError;
use crate::geometry::{compute_geometry, AngleMode, GogglesGeometry};
use crate::landmarks::FaceLandmarks;
use crate::render;

/// Where the goggles ended up for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub bbox: Option<BoundingBox>,
    pub landmarks: FaceLandmarks,
    pub geometry: GogglesGeometry,
    /// Top-left corner of the rotated overlay in image coordinates.
    pub paste_origin: (i64, i64),
}

/// Occlusion augmentation: detect a face → compute goggles geometry → composite
pub struct GogglesTransform<D> {
    detector: D,
    angle_mode: AngleMode,
}

impl<D: FaceDetector> GogglesTransform<D> {
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            angle_mode: AngleMode::default(),
        }
    }

    pub fn with_angle_mode(mut self, angle_mode: AngleMode) -> Self {
        self.angle_mode = angle_mode;
        self
    }

    pub fn angle_mode(&self) -> AngleMode {
        self.angle_mode
    }

    /// Draw goggles over the first detected face. Images without a face come
    /// back untouched.
    pub fn apply(&mut self, image: RgbaImage) -> Result<RgbaImage> {
        let (image, _placement) = self.apply_with_placement(image)?;
        Ok(image)
    }

    pub fn apply_with_placement(
        &mut self,
        mut image: RgbaImage,
    ) -> Result<(RgbaImage, Option<Placement>)> {
        let detection = self.detector.detect(&image).context("detecting faces")?;
        log::debug!("detector returned {} face(s)", detection.face_count());

        let Some(flat) = detection.first_landmarks() else {
            return Ok((image, None));
        };
        let landmarks = FaceLandmarks::from_flat(flat)?;

        let mut placement = place(&landmarks, self.angle_mode, &mut image)?;
        placement.bbox = detection.first_box().copied();
        Ok((image, Some(placement)))
    }

    /// Run only the detector and geometry, leaving the image alone.
    pub fn inspect(
        &mut self,
        image: &RgbaImage,
    ) -> Result<Option<(DetectionResult, GogglesGeometry)>> {
        let detection = self.detector.detect(image).context("detecting faces")?;
        let Some(flat) = detection.first_landmarks() else {
            return Ok(None);
        };
        let landmarks = FaceLandmarks::from_flat(flat)?;
        let geometry = compute_geometry(&landmarks, self.angle_mode)?;
        Ok(Some((detection, geometry)))
    }
}

/// Composite goggles for already-known landmarks.
pub fn place(
    landmarks: &FaceLandmarks,
    angle_mode: AngleMode,
    image: &mut RgbaImage,
) -> Result<Placement, PlacementError> {
    let geometry = compute_geometry(landmarks, angle_mode)?;
    log::debug!(
        "eye midpoint ({:.1}, {:.1}), goggles {:.1}x{:.1}, angle {:.2}",
        geometry.eye_midpoint.x,
        geometry.eye_midpoint.y,
        geometry.width,
        geometry.height,
        geometry.angle_degrees
    );
    let paste_origin = render::draw_goggles(image, &geometry);
    Ok(Placement {
        bbox: None,
        landmarks: *landmarks,
        geometry,
        paste_origin,
    })
}
