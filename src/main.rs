// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
use std::env;
use std::sync::Arc;

use anyhow::Result;
use instadetect::api::{start_server, AppState};
use instadetect::config::Config;
use instadetect::detector::{DetectorRegistry, ModelKind};
use instadetect::vision::Annotator;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    tracing::info!("starting InstaDetect API");

    // Report back-end availability up front so a missing export shows up in
    // the log at startup, not only as a 503 on first use
    for kind in ModelKind::ALL {
        let path = config.model_path(kind);
        if path.exists() {
            tracing::info!("{}: model file found at {}", kind, path.display());
        } else {
            tracing::warn!(
                "{}: model file missing at {}, requests for it will fail as unavailable",
                kind,
                path.display()
            );
        }
    }

    let state = AppState {
        registry: Arc::new(DetectorRegistry::from_config(&config)),
        annotator: Arc::new(Annotator::new()),
    };

    start_server(&config, state).await
}
