// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Normalized detection records
//!
//! Every back end reshapes its raw model output into [`Detection`] so the
//! aggregator, visualizer and wire envelope never care which model ran.

use serde::{Deserialize, Serialize};

/// One located, labeled object instance.
///
/// The box is `[x1, y1, x2, y2]` in source-image pixel space with
/// `x1 < x2` and `y1 < y2`, the score is in `[0.0, 1.0]`, and the label is
/// always one of the prompts supplied for the call that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
    pub score: f32,
    pub label: String,
}

impl Detection {
    /// Build a detection with the box clamped to the image bounds.
    ///
    /// Returns `None` when the clamped box is degenerate (zero width or
    /// height), which happens for boxes entirely outside the image.
    pub fn clamped(
        bbox: [f32; 4],
        score: f32,
        label: impl Into<String>,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        let (w, h) = (image_width as f32, image_height as f32);
        let x1 = bbox[0].clamp(0.0, w);
        let y1 = bbox[1].clamp(0.0, h);
        let x2 = bbox[2].clamp(0.0, w);
        let y2 = bbox[3].clamp(0.0, h);
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(Self {
            bbox: [x1, y1, x2, y2],
            score,
            label: label.into(),
        })
    }

    /// Box width in pixels.
    pub fn width(&self) -> f32 {
        self.bbox[2] - self.bbox[0]
    }

    /// Box height in pixels.
    pub fn height(&self) -> f32 {
        self.bbox[3] - self.bbox[1]
    }
}
