use anyhow::Result;
use image::RgbaImage;

/// Face rectangle in source pixels: x, y, w, h.
pub type BoundingBox = [f32; 4];

/// Output of a face detector for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    /// Per-face boxes and planar landmark arrays (`[x0..x4, y0..y4]`), best face first.
    Detected {
        boxes: Vec<BoundingBox>,
        landmarks: Vec<Vec<f32>>,
    },
    NotDetected,
}

impl DetectionResult {
    pub fn from_faces(boxes: Vec<BoundingBox>, landmarks: Vec<Vec<f32>>) -> Self {
        if landmarks.is_empty() {
            Self::NotDetected
        } else {
            Self::Detected { boxes, landmarks }
        }
    }

    pub fn first_landmarks(&self) -> Option<&[f32]> {
        match self {
            Self::Detected { landmarks, .. } => landmarks.first().map(Vec::as_slice),
            Self::NotDetected => None,
        }
    }

    pub fn first_box(&self) -> Option<&BoundingBox> {
        match self {
            Self::Detected { boxes, .. } => boxes.first(),
            Self::NotDetected => None,
        }
    }

    pub fn face_count(&self) -> usize {
        match self {
            Self::Detected { landmarks, .. } => landmarks.len(),
            Self::NotDetected => 0,
        }
    }
}

/// Anything that can find faces and their five landmarks in an image.
pub trait FaceDetector {
    fn detect(&mut self, image: &RgbaImage) -> Result<DetectionResult>;
}

impl<F> FaceDetector for F
where
    F: FnMut(&RgbaImage) -> Result<DetectionResult>,
{
    fn detect(&mut self, image: &RgbaImage) -> Result<DetectionResult> {
        self(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_landmarks_mean_not_detected() {
        let r = DetectionResult::from_faces(vec![[0.0, 0.0, 5.0, 5.0]], vec![]);
        assert_eq!(r, DetectionResult::NotDetected);
        assert_eq!(r.first_landmarks(), None);
        assert_eq!(r.face_count(), 0);
    }

    #[test]
    fn first_face_is_reported() {
        let r = DetectionResult::from_faces(
            vec![[1.0, 2.0, 3.0, 4.0], [9.0, 9.0, 9.0, 9.0]],
            vec![vec![1.0; 10], vec![2.0; 10]],
        );
        assert_eq!(r.face_count(), 2);
        assert_eq!(r.first_landmarks(), Some(&[1.0; 10][..]));
        assert_eq!(r.first_box(), Some(&[1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn closures_are_detectors() {
        let mut calls = 0;
        {
            let mut det = |_: &RgbaImage| -> Result<DetectionResult> {
                calls += 1;
                Ok(DetectionResult::NotDetected)
            };
            let img = RgbaImage::new(2, 2);
            assert_eq!(det.detect(&img).unwrap(), DetectionResult::NotDetected);
        }
        assert_eq!(calls, 1);
    }
}
