// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic stub detector
//!
//! Serves the integration tests and offline demos. Unlike the real back
//! ends it holds a canned detection list, but it honors the exact same
//! contract: threshold filtering, prompt-membership filtering and box
//! clamping all apply. It is never substituted for a real model on load
//! failure; that path surfaces [`DetectorError::Unavailable`] instead.

use async_trait::async_trait;
use image::DynamicImage;

use super::types::Detection;
use super::{Detector, DetectorError};

/// In-memory detector returning a fixed detection list.
#[derive(Debug, Clone, Default)]
pub struct MockDetector {
    canned: Vec<Detection>,
}

impl MockDetector {
    pub fn new(canned: Vec<Detection>) -> Self {
        Self { canned }
    }
}

#[async_trait]
impl Detector for MockDetector {
    async fn detect(
        &self,
        image: &DynamicImage,
        prompts: &[String],
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        Ok(self
            .canned
            .iter()
            .filter(|det| det.score >= confidence_threshold)
            .filter(|det| prompts.iter().any(|p| p == &det.label))
            .filter_map(|det| {
                Detection::clamped(
                    det.bbox,
                    det.score,
                    det.label.clone(),
                    image.width(),
                    image.height(),
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canned() -> Vec<Detection> {
        vec![
            Detection {
                bbox: [10.0, 10.0, 50.0, 50.0],
                score: 0.6,
                label: "person".to_string(),
            },
            Detection {
                bbox: [100.0, 100.0, 150.0, 160.0],
                score: 0.4,
                label: "car".to_string(),
            },
        ]
    }

    fn prompts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_filters_below_threshold() {
        let detector = MockDetector::new(canned());
        let image = DynamicImage::new_rgb8(640, 480);
        let dets = detector
            .detect(&image, &prompts(&["person", "car"]), 0.5)
            .await
            .unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "person");
        assert!(dets.iter().all(|d| d.score >= 0.5));
    }

    #[tokio::test]
    async fn test_filters_labels_outside_prompts() {
        let detector = MockDetector::new(canned());
        let image = DynamicImage::new_rgb8(640, 480);
        let dets = detector
            .detect(&image, &prompts(&["car"]), 0.0)
            .await
            .unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "car");
    }

    #[tokio::test]
    async fn test_clamps_to_image_bounds() {
        let detector = MockDetector::new(vec![Detection {
            bbox: [-10.0, -10.0, 900.0, 900.0],
            score: 0.9,
            label: "person".to_string(),
        }]);
        let image = DynamicImage::new_rgb8(640, 480);
        let dets = detector
            .detect(&image, &prompts(&["person"]), 0.5)
            .await
            .unwrap();
        assert_eq!(dets[0].bbox, [0.0, 0.0, 640.0, 480.0]);
    }
}
