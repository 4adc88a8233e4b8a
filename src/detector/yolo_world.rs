// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! YOLO-World detector adapter
//!
//! Wraps a YOLO-World ONNX export with fused NMS. The image is letterboxed
//! onto a 640x640 canvas (aspect ratio preserved, gray padding) and the
//! fused output rows `[x1, y1, x2, y2, score, class_id]` come back in
//! letterbox space, so decoding runs the inverse letterbox transform before
//! the records leave the adapter.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use image::{imageops, DynamicImage, RgbImage};
use ndarray::{Array4, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use super::types::Detection;
use super::{Detector, DetectorError};

/// Letterbox canvas edge length.
const INPUT_SIZE: u32 = 640;

/// Padding gray used by the YOLO family.
const PAD_VALUE: u8 = 114;

/// Mapping from source-image space to the letterboxed model input.
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// YOLO-World open-vocabulary detector.
///
/// Inference is serialized behind a mutex; the runtime session is not
/// assumed re-entrant.
#[derive(Debug)]
pub struct YoloWorldDetector {
    session: Mutex<Session>,
}

impl YoloWorldDetector {
    /// Load the YOLO-World export from disk.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::Unavailable(format!(
                "YOLO-World model file not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .and_then(|b| b.with_execution_providers([CPUExecutionProvider::default().build()]))
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(4))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                DetectorError::Unavailable(format!(
                    "failed to load YOLO-World model from {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        info!("YOLO-World model loaded from {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Letterbox the image onto the model canvas and build a NCHW tensor
    /// scaled to `[0, 1]`.
    fn preprocess(image: &DynamicImage) -> (Array4<f32>, Letterbox) {
        let (w, h) = (image.width(), image.height());
        let scale = (INPUT_SIZE as f32 / w as f32).min(INPUT_SIZE as f32 / h as f32);
        let new_w = ((w as f32 * scale).round() as u32).max(1);
        let new_h = ((h as f32 * scale).round() as u32).max(1);
        let pad_x = (INPUT_SIZE - new_w) / 2;
        let pad_y = (INPUT_SIZE - new_h) / 2;

        let resized = image
            .resize_exact(new_w, new_h, image::imageops::FilterType::Triangle)
            .to_rgb8();
        let mut canvas =
            RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, image::Rgb([PAD_VALUE; 3]));
        imageops::overlay(&mut canvas, &resized, pad_x as i64, pad_y as i64);

        let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }

        (
            tensor,
            Letterbox {
                scale,
                pad_x: pad_x as f32,
                pad_y: pad_y as f32,
            },
        )
    }
}

#[async_trait]
impl Detector for YoloWorldDetector {
    async fn detect(
        &self,
        image: &DynamicImage,
        prompts: &[String],
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        let (img_w, img_h) = (image.width(), image.height());
        let (tensor, letterbox) = Self::preprocess(image);

        let mut session = self.session.lock().unwrap();
        let outputs = session
            .run(ort::inputs![
                "images" => Value::from_array(tensor)
                    .map_err(|e| DetectorError::Inference(e.to_string()))?
            ])
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let raw = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let rows = if raw.ndim() == 3 {
            raw.index_axis_move(ndarray::Axis(0), 0)
        } else {
            raw
        };
        let rows = rows
            .into_dimensionality::<Ix2>()
            .map_err(|e| DetectorError::Inference(format!("unexpected output shape: {}", e)))?;
        if rows.ncols() != 6 {
            return Err(DetectorError::Inference(format!(
                "unexpected output width: {} (expected 6)",
                rows.ncols()
            )));
        }

        let mut detections = Vec::new();
        for row in rows.rows() {
            let score = row[4];
            if score < confidence_threshold {
                continue;
            }
            if row[5] < 0.0 {
                continue;
            }
            let Some(label) = prompts.get(row[5] as usize) else {
                continue;
            };
            // Inverse letterbox: undo padding, then the uniform scale
            let bbox = [
                (row[0] - letterbox.pad_x) / letterbox.scale,
                (row[1] - letterbox.pad_y) / letterbox.scale,
                (row[2] - letterbox.pad_x) / letterbox.scale,
                (row[3] - letterbox.pad_y) / letterbox.scale,
            ];
            if let Some(det) = Detection::clamped(bbox, score, label, img_w, img_h) {
                detections.push(det);
            }
        }

        debug!(
            "YOLO-World produced {} detections above threshold {:.2}",
            detections.len(),
            confidence_threshold
        );
        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "YOLO-World"
    }
}
