use anyhow::{Context, Result, anyhow, bail};
use opencv::core::{self, Mat, Scalar, Size};
use opencv::dnn;
use opencv::prelude::*;
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

use super::types::{BoundingBox, Detection};

/// Per-class IoU above which the weaker of two boxes is dropped.
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Scores below this never leave the decoder; the annotators apply the real filter.
const CANDIDATE_FLOOR: f32 = 0.05;

/// Anything that turns a frame into scored, labelled boxes.
pub trait ObjectDetector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub score: f32,
    pub bbox: BoundingBox,
}

/// Number of classes encoded in a `[1, 4 + classes, anchors]` output shape.
///
/// The class count comes from the model itself; configured labels only name them.
pub fn classes_in_output(shape: &[i32]) -> Result<usize> {
    match shape {
        [1, channels, anchors] if *channels > 4 && *anchors > 0 => Ok(*channels as usize - 4),
        _ => bail!(
            "Unsupported model output shape {:?}, expected [1, 4 + classes, anchors]",
            shape
        ),
    }
}

/// Decode a YOLO style `[1, 4 + classes, anchors]` tensor laid out row major.
///
/// Each anchor column holds centre x, centre y, width, height (model input
/// pixels) followed by one score per class. Boxes are scaled back to frame
/// pixels with `scale_x` / `scale_y`.
pub fn decode_predictions(
    data: &[f32],
    num_classes: usize,
    scale_x: f32,
    scale_y: f32,
    min_score: f32,
) -> Result<Vec<Candidate>> {
    let channels = 4 + num_classes;
    if num_classes == 0 || data.len() % channels != 0 {
        bail!(
            "Model output of {} values does not fit {} classes",
            data.len(),
            num_classes
        );
    }
    let anchors = data.len() / channels;

    let mut candidates = Vec::new();
    for i in 0..anchors {
        let (class_id, score) = (0..num_classes)
            .map(|c| (c, data[(4 + c) * anchors + i]))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < min_score {
            continue;
        }

        let cx = data[i];
        let cy = data[anchors + i];
        let w = data[2 * anchors + i];
        let h = data[3 * anchors + i];

        let bbox = BoundingBox::from_xyxy(
            (cx - w / 2.0) * scale_x,
            (cy - h / 2.0) * scale_y,
            (cx + w / 2.0) * scale_x,
            (cy + h / 2.0) * scale_y,
        );
        candidates.push(Candidate { class_id, score, bbox });
    }

    Ok(candidates)
}

/// Greedy per-class suppression. The result is ordered by descending score.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut keep: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if keep.iter().all(|kept| {
            kept.class_id != candidate.class_id || kept.bbox.iou(&candidate.bbox) <= iou_threshold
        }) {
            keep.push(candidate);
        }
    }
    keep
}

/// Map a class index to its configured name, falling back to the index itself.
pub fn label_for(labels: &[String], class_id: usize) -> String {
    labels
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| class_id.to_string())
}

/// Pretrained ONNX detector executed through OpenCV DNN.
pub struct OnnxDetector {
    net: dnn::Net,
    labels: Vec<String>,
    input_size: i32,
}

impl OnnxDetector {
    pub fn load(model_path: &Path, labels: Vec<String>, input_size: i32) -> Result<Self> {
        if !model_path.exists() {
            bail!("Model not found: {}", model_path.display());
        }
        if labels.is_empty() {
            bail!("At least one model label is required");
        }
        let path = model_path
            .to_str()
            .ok_or_else(|| anyhow!("Model path is not valid UTF-8: {}", model_path.display()))?;

        let net = dnn::read_net_from_onnx(path)
            .with_context(|| format!("Failed to load model {}", model_path.display()))?;

        info!(
            "Loaded detection model {} ({} classes, input {}px)",
            model_path.display(),
            labels.len(),
            input_size
        );

        Ok(Self {
            net,
            labels,
            input_size,
        })
    }
}

impl ObjectDetector<Mat> for OnnxDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>> {
        let size = frame.size()?;
        if size.width <= 0 || size.height <= 0 {
            return Err(anyhow!("Cannot run detection on an empty frame"));
        }

        // BGR frame in, RGB [0,1] square blob out
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            Size::new(self.input_size, self.input_size),
            Scalar::default(),
            true,
            false,
            core::CV_32F,
        )?;
        self.net.set_input(&blob, "", 1.0, Scalar::default())?;
        let output = self.net.forward_single("")?;
        let num_classes = classes_in_output(&output.mat_size())?;
        let data = output.data_typed::<f32>()?;

        let scale_x = size.width as f32 / self.input_size as f32;
        let scale_y = size.height as f32 / self.input_size as f32;

        let candidates =
            decode_predictions(data, num_classes, scale_x, scale_y, CANDIDATE_FLOOR)?;

        Ok(non_max_suppression(candidates, NMS_IOU_THRESHOLD)
            .into_iter()
            .map(|c| Detection {
                label: label_for(&self.labels, c.class_id),
                score: c.score,
                bbox: c.bbox.clamp_to(size.width, size.height),
            })
            .collect())
    }
}
