// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
pub mod aggregate;
pub mod api;
pub mod config;
pub mod detector;
pub mod vision;

// Re-export the types the binary and integration tests reach for
pub use aggregate::{aggregate, LabelGroup, Summary};
pub use api::{build_router, ApiError, AppState};
pub use config::Config;
pub use detector::{Detection, Detector, DetectorError, DetectorRegistry, ModelKind};
pub use vision::Annotator;
