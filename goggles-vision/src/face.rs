use std::path::Path;

use anyhow::Result;
use image::{imageops, Rgba, RgbaImage};
use ndarray::Array4;
use ort::{session::Session, value::Value};

use crate::detector::{DetectionResult, FaceDetector};
use crate::landmarks::interleaved_to_planar;
use crate::yunet;

/// YuNet input is a fixed 640x640 canvas.
const INPUT_SIZE: u32 = 640;

/// Detection result from YuNet, in source-image pixels
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: [f32; 4], // x, y, w, h
    pub score: f32,
    pub landmarks: [f32; 10], // 5 points: x1,y1,x2,y2,...,x5,y5
}

/// Detect faces with YuNet. Results are sorted by score, best first.
pub fn detect_faces(
    session: &mut Session,
    img: &RgbaImage,
    score_threshold: f32,
    nms_threshold: f32,
) -> Result<Vec<Detection>> {
    let target = INPUT_SIZE;
    let (orig_width, orig_height) = img.dimensions();
    if orig_width == 0 || orig_height == 0 {
        return Ok(vec![]);
    }

    // Letterbox into a square canvas to avoid distortion
    let scale = target as f32 / orig_width.max(orig_height) as f32;
    let new_width = ((orig_width as f32 * scale) as u32).max(1);
    let new_height = ((orig_height as f32 * scale) as u32).max(1);
    let resized = imageops::resize(img, new_width, new_height, imageops::FilterType::Triangle);

    let mut canvas = RgbaImage::from_pixel(target, target, Rgba([0, 0, 0, 255]));
    let offset_x = (target - new_width) / 2;
    let offset_y = (target - new_height) / 2;
    imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

    // [1, 3, H, W] planar BGR, values in [0, 255]
    let pixel_count = (target * target) as usize;
    let mut input_data = vec![0.0f32; 3 * pixel_count];
    let (b_channel, rest) = input_data.split_at_mut(pixel_count);
    let (g_channel, r_channel) = rest.split_at_mut(pixel_count);
    for (i, p) in canvas.pixels().enumerate() {
        r_channel[i] = p[0] as f32;
        g_channel[i] = p[1] as f32;
        b_channel[i] = p[2] as f32;
    }

    let input_array =
        Array4::from_shape_vec((1, 3, target as usize, target as usize), input_data)?;
    let input_tensor = Value::from_array(input_array)?;
    let outputs = session.run(ort::inputs![input_tensor])?;

    let mut output_data: Vec<(Vec<i64>, Vec<f32>)> = Vec::new();
    for (_name, output) in outputs.iter() {
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        output_data.push((shape.iter().copied().collect(), data.to_vec()));
    }
    let output_refs: Vec<(&[i64], &[f32])> = output_data
        .iter()
        .map(|(s, d)| (s.as_slice(), d.as_slice()))
        .collect();

    let mut heads = yunet::parse_yunet_outputs(&output_refs, target as usize)?;
    yunet::apply_sigmoid_to_scores(&mut heads.scores);
    let raw = yunet::decode_detections(&heads, score_threshold, target as usize)?;

    // Normalised canvas coordinates → source pixels
    let unmap_x = |v: f32| (v * target as f32 - offset_x as f32) / scale;
    let unmap_y = |v: f32| (v * target as f32 - offset_y as f32) / scale;
    let detections: Vec<Detection> = raw
        .into_iter()
        .map(|d| {
            let mut landmarks = [0.0f32; 10];
            for k in 0..5 {
                landmarks[k * 2] = unmap_x(d.landmarks[k * 2]);
                landmarks[k * 2 + 1] = unmap_y(d.landmarks[k * 2 + 1]);
            }
            Detection {
                bbox: [
                    unmap_x(d.bbox[0]),
                    unmap_y(d.bbox[1]),
                    d.bbox[2] * target as f32 / scale,
                    d.bbox[3] * target as f32 / scale,
                ],
                score: d.score,
                landmarks,
            }
        })
        .collect();

    Ok(nms(&detections, nms_threshold))
}

/// Non-maximum suppression. The output is sorted by score, highest first.
pub fn nms(detections: &[Detection], iou_threshold: f32) -> Vec<Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    if iou_threshold >= 1.0 {
        return sorted;
    }

    let mut keep: Vec<Detection> = Vec::new();
    for candidate in sorted {
        if keep
            .iter()
            .all(|k| compute_iou(&k.bbox, &candidate.bbox) <= iou_threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn compute_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = (a[0] + a[2]).min(b[0] + b[2]);
    let y2 = (a[1] + a[3]).min(b[1] + b[3]);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let inter = (x2 - x1) * (y2 - y1);
    inter / (a[2] * a[3] + b[2] * b[3] - inter)
}

impl From<Vec<Detection>> for DetectionResult {
    fn from(detections: Vec<Detection>) -> Self {
        let boxes = detections.iter().map(|d| d.bbox).collect();
        let landmarks = detections
            .iter()
            .map(|d| interleaved_to_planar(&d.landmarks))
            .collect();
        DetectionResult::from_faces(boxes, landmarks)
    }
}

/// [`FaceDetector`] backed by a YuNet ONNX session.
pub struct YuNetDetector {
    session: Session,
    score_threshold: f32,
    nms_threshold: f32,
}

impl YuNetDetector {
    pub fn open(model_path: &Path, score_threshold: f32, nms_threshold: f32) -> Result<Self> {
        Ok(Self {
            session: crate::model::detector_session(model_path)?,
            score_threshold,
            nms_threshold,
        })
    }

    pub fn detections(&mut self, image: &RgbaImage) -> Result<Vec<Detection>> {
        detect_faces(
            &mut self.session,
            image,
            self.score_threshold,
            self.nms_threshold,
        )
    }
}

impl FaceDetector for YuNetDetector {
    fn detect(&mut self, image: &RgbaImage) -> Result<DetectionResult> {
        let detections = self.detections(image)?;
        log::debug!("yunet: {} face(s) after nms", detections.len());
        Ok(detections.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(bbox: [f32; 4], score: f32) -> Detection {
        Detection {
            bbox,
            score,
            landmarks: [0.0; 10],
        }
    }

    #[test]
    fn test_iou() {
        let a = [10.0, 10.0, 20.0, 20.0];
        let b = [15.0, 15.0, 20.0, 20.0];
        let iou = compute_iou(&a, &b);
        assert!(iou > 0.0 && iou < 1.0);

        let c = [100.0, 100.0, 10.0, 10.0];
        assert_eq!(compute_iou(&a, &c), 0.0);
        assert!((compute_iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms() {
        let detections = vec![
            det([10.0, 10.0, 20.0, 20.0], 0.8),
            det([12.0, 12.0, 20.0, 20.0], 0.9),
            det([100.0, 100.0, 20.0, 20.0], 0.85),
        ];

        let result = nms(&detections, 0.3);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].score, 0.9);
        assert_eq!(result[1].score, 0.85);
    }

    #[test]
    fn nms_disabled_still_sorts() {
        let detections = vec![det([0.0; 4], 0.1), det([0.0; 4], 0.7)];
        let result = nms(&detections, 1.0);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].score, 0.7);
    }

    #[test]
    fn detections_convert_to_planar_result() {
        let mut d = det([1.0, 2.0, 3.0, 4.0], 0.9);
        d.landmarks = [10.0, 11.0, 20.0, 21.0, 15.0, 30.0, 12.0, 40.0, 18.0, 41.0];
        let result: DetectionResult = vec![d].into();
        assert_eq!(
            result.first_landmarks(),
            Some(&[10.0, 20.0, 15.0, 12.0, 18.0, 11.0, 21.0, 30.0, 40.0, 41.0][..])
        );
        assert_eq!(result.first_box(), Some(&[1.0, 2.0, 3.0, 4.0]));

        let none: DetectionResult = Vec::<Detection>::new().into();
        assert_eq!(none, DetectionResult::NotDetected);
    }
}
