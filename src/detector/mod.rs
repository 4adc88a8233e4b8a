// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Detector back ends
//!
//! Every supported model family is wrapped in an adapter implementing the
//! [`Detector`] trait, so the API layer is indifferent to which back end
//! runs. Back ends are selected by [`ModelKind`] and lazily loaded through
//! the [`DetectorRegistry`] (one process-wide handle per model).

pub mod error;
pub mod mock;
pub mod ov_dino;
pub mod registry;
pub mod types;
pub mod yolo_world;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use image::DynamicImage;

pub use error::DetectorError;
pub use mock::MockDetector;
pub use ov_dino::OvDinoDetector;
pub use registry::{DetectorRegistry, DynDetector};
pub use types::Detection;
pub use yolo_world::YoloWorldDetector;

/// Common interface for object-detection back ends.
///
/// Contract, regardless of the model behind it:
/// - every returned score is `>= confidence_threshold`
/// - every returned label is one of `prompts`
/// - boxes are in source-image pixel space, clamped to the image bounds
///
/// Implementations must not assume the underlying runtime session is safe to
/// call concurrently; adapters here serialize inference internally.
#[async_trait]
pub trait Detector: Send + Sync + std::fmt::Debug {
    async fn detect(
        &self,
        image: &DynamicImage,
        prompts: &[String],
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError>;

    /// Back end name for logging.
    fn name(&self) -> &'static str;
}

/// The fixed set of supported detection back ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    OvDino,
    YoloWorld,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::OvDino, ModelKind::YoloWorld];

    /// Wire name, as the UI sends it.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::OvDino => "OV-DINO",
            ModelKind::YoloWorld => "YOLO-World",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ov-dino" | "ovdino" | "ov_dino" => Ok(ModelKind::OvDino),
            "yolo-world" | "yoloworld" | "yolo_world" => Ok(ModelKind::YoloWorld),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_model_kind_is_case_insensitive() {
        assert_eq!("ov-dino".parse::<ModelKind>(), Ok(ModelKind::OvDino));
        assert_eq!("YOLO-WORLD".parse::<ModelKind>(), Ok(ModelKind::YoloWorld));
        assert_eq!("yolo_world".parse::<ModelKind>(), Ok(ModelKind::YoloWorld));
    }

    #[test]
    fn test_unknown_model_kind_is_rejected() {
        assert!("Foo".parse::<ModelKind>().is_err());
        assert!("".parse::<ModelKind>().is_err());
    }
}
