// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Detect endpoint handler

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use axum_extra::extract::Multipart;
use tracing::{debug, info};

use super::request::DetectForm;
use super::response::DetectResponse;
use crate::aggregate::aggregate;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_upload, to_data_uri};

/// POST /detect - Run object detection on an uploaded image
///
/// Multipart form fields:
/// - `file`: image bytes (required)
/// - `model_name`: one of the supported back ends (required)
/// - `confidence_threshold`: string-encoded float in [0,1], default 0.5
/// - `prompts`: newline-separated category names (required)
///
/// The per-request path is `Received -> Decoded -> Detected -> Annotated ->
/// Responded`; every failure short-circuits into an [`ApiError`] with a
/// non-2xx status. `inference_time` measures the detector call only, not
/// image decode or annotation.
pub async fn detect_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    // 1. Parse and validate the form; no model work before this passes
    let form = DetectForm::from_multipart(multipart).await?;
    debug!(
        "detect request: model={}, threshold={:.2}, {} prompts, {} byte upload",
        form.model,
        form.confidence_threshold,
        form.prompts.len(),
        form.file.len()
    );

    // 2. Decode the upload
    let (image, image_info) =
        decode_upload(&form.file).map_err(|e| ApiError::InvalidImage(e.to_string()))?;
    debug!(
        "decoded image: {}x{} {:?}",
        image_info.width, image_info.height, image_info.format
    );

    // 3. Resolve the back end (lazy load on first use)
    let detector = state
        .registry
        .get(form.model)
        .await
        .map_err(|e| ApiError::from_detector(form.model, e))?;

    // 4. Run detection, timing the adapter call alone
    let start = Instant::now();
    let detections = detector
        .detect(&image, &form.prompts, form.confidence_threshold)
        .await
        .map_err(|e| ApiError::from_detector(form.model, e))?;
    let inference_time = start.elapsed().as_secs_f64() * 1000.0;

    info!(
        "{} found {} objects in {:.1}ms",
        detector.name(),
        detections.len(),
        inference_time
    );

    // 5. Aggregate and annotate
    let summary = aggregate(&detections);
    let annotated = state.annotator.annotate(&image, &detections);
    let image_base64 =
        to_data_uri(&annotated).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(DetectResponse {
        message: "Detection completed".to_string(),
        model_used: form.model.as_str().to_string(),
        detections,
        summary,
        inference_time,
        image_base64,
    }))
}
