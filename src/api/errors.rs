// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! API error taxonomy
//!
//! Every failure crossing the HTTP boundary maps to one of these variants
//! and a non-2xx status code; a failed request is never disguised as a
//! successful empty result. `InferenceFailed` deliberately hides its
//! internal detail from the wire; the detail is logged server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::detector::{DetectorError, ModelKind};

/// Wire shape of every error response.
///
/// `error` keeps the original single-field contract the UI renders;
/// `error_type` lets clients branch without parsing the message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub error_type: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Uploaded bytes are not a decodable image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A form field is missing or malformed.
    #[error("{field}: {message}")]
    ValidationError { field: String, message: String },

    /// The requested back end is not in the supported enumeration.
    #[error("model '{model}' not found, available: {available_models:?}")]
    ModelNotFound {
        model: String,
        available_models: Vec<String>,
    },

    /// The selected back end's model failed to load.
    #[error("model '{model}' unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// The model loaded but the call failed.
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::ModelNotFound { .. } => StatusCode::BAD_REQUEST,
            ApiError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InferenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidImage(_) => "invalid_image",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::ModelNotFound { .. } => "model_not_found",
            ApiError::ModelUnavailable { .. } => "model_unavailable",
            ApiError::InferenceFailed(_) => "inference_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Message as sent to the client. Inference and internal failures are
    /// reported generically; their detail stays in the server log.
    fn public_message(&self) -> String {
        match self {
            ApiError::InferenceFailed(_) => "detection failed, see server logs".to_string(),
            ApiError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Error for an unsupported model name, listing what is supported.
    pub fn unknown_model(model: impl Into<String>) -> Self {
        ApiError::ModelNotFound {
            model: model.into(),
            available_models: ModelKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
        }
    }

    /// Map a detector failure for a given back end.
    pub fn from_detector(kind: ModelKind, err: DetectorError) -> Self {
        match err {
            DetectorError::Unavailable(reason) => ApiError::ModelUnavailable {
                model: kind.as_str().to_string(),
                reason,
            },
            DetectorError::Inference(reason) => ApiError::InferenceFailed(reason),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("request failed ({}): {}", self.error_type(), self);
        let body = ErrorBody {
            error: self.public_message(),
            error_type: self.error_type().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
