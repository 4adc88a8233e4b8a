// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Detect response envelope

use serde::Serialize;

use crate::aggregate::Summary;
use crate::detector::Detection;

/// Success envelope for POST /detect.
///
/// Field names match the original wire contract (`message`, `model_used`,
/// `detections`, `inference_time`, `image_base64`); `summary` carries the
/// aggregator output so every client renders identical statistics.
#[derive(Debug, Clone, Serialize)]
pub struct DetectResponse {
    /// Human-readable status message
    pub message: String,
    /// Echoed back end name
    pub model_used: String,
    /// Post-threshold-filter detections
    pub detections: Vec<Detection>,
    /// Per-label and histogram statistics over `detections`
    pub summary: Summary,
    /// Wall-clock milliseconds spent strictly in the detector call
    pub inference_time: f64,
    /// Annotated image as an embeddable data URI
    pub image_base64: String,
}
