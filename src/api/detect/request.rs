// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Detect request parsing and validation
//!
//! The endpoint accepts a multipart form: `file` (image bytes),
//! `model_name`, `confidence_threshold` (string float, default 0.5) and
//! `prompts` (newline-separated category names). Validation happens here,
//! before any image decode or model work.

use axum::body::Bytes;
use axum_extra::extract::Multipart;

use crate::api::errors::ApiError;
use crate::detector::ModelKind;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Parsed and validated /detect form.
#[derive(Debug)]
pub struct DetectForm {
    pub file: Bytes,
    pub model: ModelKind,
    pub confidence_threshold: f32,
    /// Trimmed, deduplicated, order-preserving prompt vocabulary.
    pub prompts: Vec<String>,
}

impl DetectForm {
    /// Drain a multipart stream into a validated form.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut file: Option<Bytes> = None;
        let mut model_name: Option<String> = None;
        let mut threshold_raw: Option<String> = None;
        let mut prompts_raw: Option<String> = None;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::ValidationError {
                field: "form".to_string(),
                message: format!("malformed multipart body: {}", e),
            }
        })? {
            match field.name().unwrap_or_default() {
                "file" => {
                    file = Some(field.bytes().await.map_err(|e| ApiError::ValidationError {
                        field: "file".to_string(),
                        message: format!("failed to read upload: {}", e),
                    })?)
                }
                "model_name" => {
                    model_name = Some(field.text().await.map_err(|e| unreadable("model_name", e))?)
                }
                "confidence_threshold" => {
                    threshold_raw = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| unreadable("confidence_threshold", e))?,
                    )
                }
                "prompts" => {
                    prompts_raw = Some(field.text().await.map_err(|e| unreadable("prompts", e))?)
                }
                // Unknown fields are ignored, matching lenient form handling
                _ => {}
            }
        }

        let file = file.ok_or_else(|| missing("file"))?;
        if file.is_empty() {
            return Err(ApiError::ValidationError {
                field: "file".to_string(),
                message: "uploaded file is empty".to_string(),
            });
        }

        let model_name = model_name.ok_or_else(|| missing("model_name"))?;
        let model = model_name
            .parse::<ModelKind>()
            .map_err(|_| ApiError::unknown_model(&model_name))?;

        let confidence_threshold = match threshold_raw {
            None => DEFAULT_CONFIDENCE_THRESHOLD,
            Some(raw) => raw.trim().parse::<f32>().map_err(|_| {
                ApiError::ValidationError {
                    field: "confidence_threshold".to_string(),
                    message: format!("'{}' is not a number", raw),
                }
            })?,
        };
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ApiError::ValidationError {
                field: "confidence_threshold".to_string(),
                message: format!(
                    "{} is out of range, expected [0.0, 1.0]",
                    confidence_threshold
                ),
            });
        }

        let prompts = parse_prompts(&prompts_raw.ok_or_else(|| missing("prompts"))?);
        if prompts.is_empty() {
            return Err(ApiError::ValidationError {
                field: "prompts".to_string(),
                message: "no non-empty prompts after trimming".to_string(),
            });
        }

        Ok(Self {
            file,
            model,
            confidence_threshold,
            prompts,
        })
    }
}

/// Split a newline-separated prompt block into a clean vocabulary:
/// lines trimmed, empties dropped, duplicates collapsed onto their first
/// occurrence so repeated entries are tolerated idempotently.
pub fn parse_prompts(raw: &str) -> Vec<String> {
    let mut prompts: Vec<String> = Vec::new();
    for line in raw.lines() {
        let prompt = line.trim();
        if prompt.is_empty() || prompts.iter().any(|p| p == prompt) {
            continue;
        }
        prompts.push(prompt.to_string());
    }
    prompts
}

fn unreadable(field: &str, err: axum_extra::extract::multipart::MultipartError) -> ApiError {
    ApiError::ValidationError {
        field: field.to_string(),
        message: format!("failed to read field: {}", err),
    }
}

fn missing(field: &str) -> ApiError {
    ApiError::ValidationError {
        field: field.to_string(),
        message: "field is required".to_string(),
    }
}
