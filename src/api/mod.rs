// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod http_server;

pub use detect::{detect_handler, DetectForm, DetectResponse};
pub use errors::{ApiError, ErrorBody};
pub use http_server::{build_router, start_server, AppState, ModelEntry, ModelsResponse};
