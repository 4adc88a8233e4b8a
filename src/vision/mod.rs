// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Image decode and annotation
//!
//! Decoding validates uploaded bytes before any model work; annotation
//! burns boxes and labels into a copy of the source image for the response.

pub mod annotate;
pub mod image_utils;

pub use annotate::{to_data_uri, Annotator};
pub use image_utils::{decode_upload, ImageInfo, UploadError};
