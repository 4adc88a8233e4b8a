// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration loaded from environment variables
//!
//! Every knob has a working default so the service starts with a bare
//! `cargo run`; a `.env` file is honored via `dotenv` in `main`.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::detector::ModelKind;

/// Runtime configuration for the InstaDetect service
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP server
    pub host: String,
    /// Bind port for the HTTP server
    pub port: u16,
    /// Path to the OV-DINO ONNX export
    pub ov_dino_model_path: PathBuf,
    /// Path to the YOLO-World ONNX export
    pub yolo_world_model_path: PathBuf,
    /// Timeout applied at the API boundary so a hung model call cannot
    /// block a request forever
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            ov_dino_model_path: PathBuf::from("./models/ov-dino-base.onnx"),
            yolo_world_model_path: PathBuf::from("./models/yolo-world.onnx"),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Build a config from environment variables, falling back to defaults
    /// for anything missing or unparseable.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            host: env::var("INSTADETECT_HOST").unwrap_or(defaults.host),
            port: env_parsed("INSTADETECT_PORT", defaults.port),
            ov_dino_model_path: env::var("OV_DINO_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ov_dino_model_path),
            yolo_world_model_path: env::var("YOLO_WORLD_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.yolo_world_model_path),
            request_timeout: Duration::from_secs(env_parsed(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }

    /// Model file configured for the given back end.
    pub fn model_path(&self, kind: ModelKind) -> &Path {
        match kind {
            ModelKind::OvDino => &self.ov_dino_model_path,
            ModelKind::YoloWorld => &self.yolo_world_model_path,
        }
    }
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config
            .model_path(ModelKind::OvDino)
            .to_string_lossy()
            .contains("ov-dino"));
        assert!(config
            .model_path(ModelKind::YoloWorld)
            .to_string_lossy()
            .contains("yolo-world"));
    }

    #[test]
    fn test_env_parsed_falls_back_on_garbage() {
        env::set_var("INSTADETECT_TEST_PORT", "not-a-number");
        assert_eq!(env_parsed("INSTADETECT_TEST_PORT", 8000u16), 8000);
        env::remove_var("INSTADETECT_TEST_PORT");
    }
}
