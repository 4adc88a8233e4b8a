// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Detector error types

use thiserror::Error;

/// Failures a detector adapter can surface to its caller.
///
/// `Unavailable` is deliberately distinct from an empty detection list: a
/// back end that cannot load its weights must say so instead of fabricating
/// results.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The underlying model could not be loaded (missing weights, bad
    /// graph, unsupported runtime).
    #[error("model unavailable: {0}")]
    Unavailable(String),

    /// The model loaded but a specific inference call failed.
    #[error("inference failed: {0}")]
    Inference(String),
}
