// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! OV-DINO detector adapter
//!
//! Wraps a prompt-conditioned OV-DINO ONNX export. The graph embeds the
//! text encoder, query selection and NMS, so the adapter only has to feed a
//! normalized image tensor and reshape the fused output back into
//! [`Detection`] records.
//!
//! Output layout: `[n, 6]` rows of `[x1, y1, x2, y2, score, class_id]` with
//! box coordinates normalized to `[0, 1]` relative to the source image and
//! `class_id` indexing the prompt vocabulary of the call.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use image::DynamicImage;
use ndarray::{Array4, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use super::types::Detection;
use super::{Detector, DetectorError};

/// Fixed square input resolution of the export.
const INPUT_SIZE: u32 = 800;

/// ImageNet normalization used by the DINO family.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// OV-DINO open-vocabulary detector.
///
/// The session is guarded by a mutex: ONNX Runtime sessions are not assumed
/// to be safe for concurrent `run` calls, so inference is serialized per
/// adapter instance.
#[derive(Debug)]
pub struct OvDinoDetector {
    session: Mutex<Session>,
}

impl OvDinoDetector {
    /// Load the OV-DINO export from disk.
    ///
    /// Fails with [`DetectorError::Unavailable`] when the file is missing or
    /// the graph cannot be committed; callers surface that distinctly from
    /// "no objects found".
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::Unavailable(format!(
                "OV-DINO model file not found: {}",
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
                    "failed to load OV-DINO model from {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        info!("OV-DINO model loaded from {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Resize to the fixed input square and normalize to a NCHW tensor.
    fn preprocess(image: &DynamicImage) -> Array4<f32> {
        let resized = image
            .resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let v = pixel[c] as f32 / 255.0;
                tensor[[0, c, y as usize, x as usize]] = (v - MEAN[c]) / STD[c];
            }
        }
        tensor
    }
}

#[async_trait]
impl Detector for OvDinoDetector {
    async fn detect(
        &self,
        image: &DynamicImage,
        prompts: &[String],
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        let (img_w, img_h) = (image.width(), image.height());
        let tensor = Self::preprocess(image);

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

        // Accept [n, 6] and the batched [1, n, 6] variant of the export
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
            // Class ids outside the request vocabulary are dropped; the
            // adapter never invents labels.
            if row[5] < 0.0 {
                continue;
            }
            let Some(label) = prompts.get(row[5] as usize) else {
                continue;
            };
            let bbox = [
                row[0] * img_w as f32,
                row[1] * img_h as f32,
                row[2] * img_w as f32,
                row[3] * img_h as f32,
            ];
            if let Some(det) = Detection::clamped(bbox, score, label, img_w, img_h) {
                detections.push(det);
            }
        }

        debug!(
            "OV-DINO produced {} detections above threshold {:.2}",
            detections.len(),
            confidence_threshold
        );
        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "OV-DINO"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_weights_is_unavailable() {
        let err = OvDinoDetector::load(Path::new("/nonexistent/ov-dino.onnx")).unwrap_err();
        assert!(matches!(err, DetectorError::Unavailable(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let image = DynamicImage::new_rgb8(64, 48);
        let tensor = OvDinoDetector::preprocess(&image);
        assert_eq!(tensor.shape(), &[1, 3, 800, 800]);
        // Black pixel => (0 - mean) / std
        let expected = (0.0 - MEAN[0]) / STD[0];
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-6);
    }
}
