//! YOLOv8 output decoding shared by model backends.
//!
//! The head emits `[1, 4 + classes, anchors]`: rows 0..4 are box centre x,
//! centre y, width and height in input pixels, the remaining rows are
//! per-class scores.

#![cfg_attr(not(feature = "backend-tract"), allow(dead_code))]

use anyhow::{anyhow, Result};

use crate::detect::result::{BoundingBox, Detection};

#[derive(Clone, Copy, Debug)]
pub(crate) struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub input_width: u32,
    pub input_height: u32,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: usize,
}

/// Decode a channel-major YOLOv8 output tensor into labelled detections.
pub(crate) fn decode(
    output: &[f32],
    channels: usize,
    anchors: usize,
    labels: &[String],
    params: DecodeParams,
) -> Result<Vec<Detection>> {
    if channels < 5 {
        return Err(anyhow!(
            "detector output requires at least 5 channels (box + 1 class), got {}",
            channels
        ));
    }
    let expected = channels
        .checked_mul(anchors)
        .ok_or_else(|| anyhow!("detector output dimensions overflow"))?;
    if output.len() != expected {
        return Err(anyhow!(
            "detector output has {} values, expected {}x{}",
            output.len(),
            channels,
            anchors
        ));
    }
    let classes = channels - 4;
    if classes != labels.len() {
        return Err(anyhow!(
            "model reports {} classes but {} labels are configured",
            classes,
            labels.len()
        ));
    }

    let max_x = params.input_width as f32;
    let max_y = params.input_height as f32;
    let at = |channel: usize, anchor: usize| output[channel * anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, score) = (0..classes)
            .map(|class| (class, at(4 + class, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, next| {
                if next.1 > best.1 {
                    next
                } else {
                    best
                }
            });
        if !score.is_finite() || score < params.confidence_threshold {
            continue;
        }
        let cx = at(0, anchor);
        let cy = at(1, anchor);
        let w = at(2, anchor);
        let h = at(3, anchor);
        candidates.push(Candidate {
            x1: (cx - w / 2.0).clamp(0.0, max_x),
            y1: (cy - h / 2.0).clamp(0.0, max_y),
            x2: (cx + w / 2.0).clamp(0.0, max_x),
            y2: (cy + h / 2.0).clamp(0.0, max_y),
            score,
            class_id,
        });
    }

    let kept = non_max_suppression(candidates, params.iou_threshold, params.max_detections);
    Ok(kept
        .into_iter()
        .map(|c| {
            Detection::new(
                labels[c.class_id].clone(),
                BoundingBox::new(c.x1 as i32, c.y1 as i32, c.x2 as i32, c.y2 as i32),
                c.score,
            )
        })
        .collect())
}

/// Class-wise greedy NMS, highest score first.
fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(k, &candidate) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = ix * iy;
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DecodeParams {
        DecodeParams {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
            input_width: 640,
            input_height: 480,
        }
    }

    fn labels() -> Vec<String> {
        vec!["Hardhat".to_string(), "NO-Mask".to_string()]
    }

    /// Build a channel-major tensor from per-anchor rows.
    fn tensor(rows: &[[f32; 6]]) -> Vec<f32> {
        let anchors = rows.len();
        let mut out = vec![0.0; 6 * anchors];
        for (anchor, row) in rows.iter().enumerate() {
            for (channel, value) in row.iter().enumerate() {
                out[channel * anchors + anchor] = *value;
            }
        }
        out
    }

    #[test]
    fn decodes_boxes_and_labels() {
        let out = tensor(&[
            [100.0, 100.0, 40.0, 20.0, 0.9, 0.1],
            [300.0, 200.0, 50.0, 50.0, 0.05, 0.8],
            [10.0, 10.0, 5.0, 5.0, 0.1, 0.1],
        ]);
        let detections = decode(&out, 6, 3, &labels(), params()).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "Hardhat");
        assert_eq!(detections[0].bbox, BoundingBox::new(80, 90, 120, 110));
        assert_eq!(detections[1].label, "NO-Mask");
        assert_eq!(detections[1].bbox, BoundingBox::new(275, 175, 325, 225));
    }

    #[test]
    fn suppresses_overlapping_boxes_of_same_class() {
        let out = tensor(&[
            [100.0, 100.0, 40.0, 40.0, 0.9, 0.0],
            [102.0, 101.0, 40.0, 40.0, 0.7, 0.0],
            [101.0, 100.0, 40.0, 40.0, 0.0, 0.6],
        ]);
        let detections = decode(&out, 6, 3, &labels(), params()).unwrap();

        let hardhats = detections.iter().filter(|d| d.label == "Hardhat").count();
        assert_eq!(hardhats, 1);
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let out = tensor(&[[0.0; 6]]);
        let only_one = vec!["Hardhat".to_string()];
        assert!(decode(&out, 6, 1, &only_one, params()).is_err());
    }
}
