use serde::Serialize;

use crate::error::PlacementError;

/// Number of coordinates in a flattened five-point landmark array.
pub const FLAT_LEN: usize = 10;

/// A 2D point in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Five facial keypoints of one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceLandmarks {
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose: Point,
    pub left_mouth: Point,
    pub right_mouth: Point,
}

impl FaceLandmarks {
    /// Decode a planar landmark array: `[x0..x4, y0..y4]` in the order
    /// left eye, right eye, nose, left mouth corner, right mouth corner.
    /// Values past the first ten (scores and the like) are ignored.
    pub fn from_flat(flat: &[f32]) -> Result<Self, PlacementError> {
        if flat.len() < FLAT_LEN {
            return Err(PlacementError::MalformedLandmarks { len: flat.len() });
        }
        let point = |i: usize| Point::new(flat[i], flat[i + 5]);
        Ok(Self {
            left_eye: point(0),
            right_eye: point(1),
            nose: point(2),
            left_mouth: point(3),
            right_mouth: point(4),
        })
    }

    pub fn points(&self) -> [Point; 5] {
        [
            self.left_eye,
            self.right_eye,
            self.nose,
            self.left_mouth,
            self.right_mouth,
        ]
    }
}

/// Convert YuNet's interleaved `x1,y1,x2,y2,...` landmarks to the planar layout.
pub fn interleaved_to_planar(interleaved: &[f32; FLAT_LEN]) -> Vec<f32> {
    let xs = interleaved.iter().step_by(2);
    let ys = interleaved.iter().skip(1).step_by(2);
    xs.chain(ys).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_planar_layout() {
        let flat = [1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        let lm = FaceLandmarks::from_flat(&flat).unwrap();
        assert_eq!(lm.left_eye, Point::new(1.0, 10.0));
        assert_eq!(lm.right_eye, Point::new(2.0, 20.0));
        assert_eq!(lm.nose, Point::new(3.0, 30.0));
        assert_eq!(lm.right_mouth, Point::new(5.0, 50.0));
        assert_eq!(lm.left_mouth, Point::new(4.0, 40.0));
    }

    #[test]
    fn rejects_short_arrays() {
        let short = [0.0; 8];
        assert!(matches!(
            FaceLandmarks::from_flat(&short),
            Err(PlacementError::MalformedLandmarks { len: 8 })
        ));
        assert!(FaceLandmarks::from_flat(&[0.0; 9]).is_err());
        assert!(FaceLandmarks::from_flat(&[]).is_err());
    }

    #[test]
    fn trailing_values_are_ignored() {
        // Ten planar coordinates followed by a detection score
        let flat = [1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 0.97, 0.5];
        let lm = FaceLandmarks::from_flat(&flat).unwrap();
        assert_eq!(lm.left_eye, Point::new(1.0, 10.0));
        assert_eq!(lm.right_mouth, Point::new(5.0, 50.0));
    }

    #[test]
    fn interleaved_conversion() {
        // Left eye (1, 10), right eye (2, 20), ...
        let yunet = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0, 5.0, 50.0];
        let planar = interleaved_to_planar(&yunet);
        assert_eq!(
            planar,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0]
        );
        let lm = FaceLandmarks::from_flat(&planar).unwrap();
        assert_eq!(lm.nose, Point::new(3.0, 30.0));
    }

    #[test]
    fn point_distance_and_midpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
        assert_eq!(a.midpoint(&b), Point::new(1.5, 2.0));
    }
}
