//! YuNet output decoding.
//!
//! The 2023mar export emits 12 tensors, four heads for each stride (8, 16, 32):
//! `cls_8, cls_16, cls_32, obj_8, obj_16, obj_32, bbox_8, bbox_16, bbox_32,
//! kps_8, kps_16, kps_32`, each shaped `[1, H*W, C]` with C = 1, 1, 4, 10.
//!
//! Decoding is anchor-free: for grid cell (i, j) at stride s,
//! `cx = (j + dx) * s`, `cy = (i + dy) * s`, `w = dw * s`, `h = dh * s`,
//! and each landmark is `((j + lx) * s, (i + ly) * s)`. Everything is returned
//! normalised by the input size.

use anyhow::{Context, Result};
use ndarray::Array2;

pub const STRIDES: [usize; 3] = [8, 16, 32];

#[derive(Debug, Clone)]
pub struct RawDetection {
    pub bbox: [f32; 4], // x, y, w, h (normalized [0,1])
    pub score: f32,
    pub landmarks: [f32; 10], // x1,y1,...,x5,y5 (normalized [0,1])
}

/// Per-stride score, box and landmark tensors.
#[derive(Debug, Clone)]
pub struct YuNetHeads {
    pub scores: Vec<Array2<f32>>,
    pub bboxes: Vec<Array2<f32>>,
    pub landmarks: Vec<Array2<f32>>,
}

fn grid_cells(input_size: usize, stride: usize) -> usize {
    (input_size / stride) * (input_size / stride)
}

/// Read the three stride tensors of one head starting at `offset`.
fn take_head(
    outputs: &[(&[i64], &[f32])],
    offset: usize,
    channels: usize,
    name: &str,
    input_size: usize,
) -> Result<Vec<Array2<f32>>> {
    STRIDES
        .iter()
        .enumerate()
        .map(|(k, &stride)| {
            let idx = offset + k;
            let expected = grid_cells(input_size, stride);
            let (shape, data) = outputs
                .get(idx)
                .with_context(|| format!("missing {} output at index {}", name, idx))?;
            if shape.len() != 3
                || shape[0] != 1
                || shape[1] as usize != expected
                || shape[2] as usize != channels
            {
                anyhow::bail!(
                    "unexpected {} shape at index {}: {:?}, expected [1, {}, {}]",
                    name,
                    idx,
                    shape,
                    expected,
                    channels
                );
            }
            Ok(Array2::from_shape_vec((expected, channels), data.to_vec())?)
        })
        .collect()
}

/// Split raw session outputs into heads. Scores are `cls * obj`, not yet
/// passed through a sigmoid.
pub fn parse_yunet_outputs(outputs: &[(&[i64], &[f32])], input_size: usize) -> Result<YuNetHeads> {
    let cls = take_head(outputs, 0, 1, "cls", input_size)?;
    let obj = take_head(outputs, 3, 1, "obj", input_size)?;
    let bboxes = take_head(outputs, 6, 4, "bbox", input_size)?;
    let landmarks = take_head(outputs, 9, 10, "kps", input_size)?;

    let scores = cls.iter().zip(obj.iter()).map(|(c, o)| c * o).collect();

    Ok(YuNetHeads {
        scores,
        bboxes,
        landmarks,
    })
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub fn apply_sigmoid_to_scores(scores: &mut [Array2<f32>]) {
    for score_map in scores {
        score_map.mapv_inplace(sigmoid);
    }
}

/// Decode every grid cell whose score reaches `score_threshold`.
pub fn decode_detections(
    heads: &YuNetHeads,
    score_threshold: f32,
    input_size: usize,
) -> Result<Vec<RawDetection>> {
    let mut detections = Vec::new();
    let norm = input_size as f32;

    for (scale_idx, &stride) in STRIDES.iter().enumerate() {
        let scores = &heads.scores[scale_idx];
        let bboxes = &heads.bboxes[scale_idx];
        let landmarks = &heads.landmarks[scale_idx];

        let feature_size = input_size / stride;
        if scores.nrows() != feature_size * feature_size {
            anyhow::bail!(
                "expected {} cells for stride {} ({}x{} grid), got {}",
                feature_size * feature_size,
                stride,
                feature_size,
                feature_size,
                scores.nrows()
            );
        }

        let s = stride as f32;
        for i in 0..feature_size {
            for j in 0..feature_size {
                let idx = i * feature_size + j;
                let score = scores[[idx, 0]];
                if score < score_threshold {
                    continue;
                }

                let cx = (j as f32 + bboxes[[idx, 0]]) * s / norm;
                let cy = (i as f32 + bboxes[[idx, 1]]) * s / norm;
                let w = bboxes[[idx, 2]] * s / norm;
                let h = bboxes[[idx, 3]] * s / norm;

                let mut lms = [0.0f32; 10];
                for k in 0..5 {
                    lms[k * 2] = (j as f32 + landmarks[[idx, k * 2]]) * s / norm;
                    lms[k * 2 + 1] = (i as f32 + landmarks[[idx, k * 2 + 1]]) * s / norm;
                }

                detections.push(RawDetection {
                    bbox: [cx - w / 2.0, cy - h / 2.0, w, h],
                    score,
                    landmarks: lms,
                });
            }
        }
    }

    Ok(detections)
}
