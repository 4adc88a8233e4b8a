// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
// tests/detect_api_tests.rs - Router-level tests for the /detect endpoint
//
// The registry is wired with stub loaders so the full HTTP path runs
// without any ONNX model on disk. Loader call counts verify that invalid
// requests never reach a back end.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use futures::FutureExt;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat};
use tower::ServiceExt;

use instadetect::api::{build_router, AppState};
use instadetect::detector::{
    Detection, DetectorError, DetectorRegistry, DynDetector, MockDetector, ModelKind,
};
use instadetect::vision::Annotator;

const BOUNDARY: &str = "instadetect-test-boundary";

fn canned_detections() -> Vec<Detection> {
    vec![
        Detection {
            bbox: [10.0, 10.0, 50.0, 50.0],
            score: 0.6,
            label: "person".to_string(),
        },
        Detection {
            bbox: [100.0, 100.0, 150.0, 160.0],
            score: 0.4,
            label: "car".to_string(),
        },
    ]
}

/// Router whose OV-DINO slot yields a stub detector; `loads` counts how
/// many times the loader ran.
fn stub_router(loads: Arc<AtomicUsize>) -> axum::Router {
    let registry = DetectorRegistry::new().with_loader(ModelKind::OvDino, move || {
        let loads = loads.clone();
        async move {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockDetector::new(canned_detections())) as DynDetector)
        }
        .boxed()
    });
    let state = AppState {
        registry: Arc::new(registry),
        annotator: Arc::new(Annotator::new()),
    };
    build_router(state, Duration::from_secs(10))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::new_rgb8(width, height);
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
    )
    .into_bytes()
}

fn file_part(name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
         filename=\"test.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    part.extend_from_slice(bytes);
    part.extend_from_slice(b"\r\n");
    part
}

fn multipart_request(parts: Vec<Vec<u8>>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(&part);
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/detect")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_detect_end_to_end_filters_below_threshold() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = multipart_request(vec![
        file_part("file", &png_bytes(640, 480)),
        text_part("model_name", "OV-DINO"),
        text_part("confidence_threshold", "0.5"),
        text_part("prompts", "person\ncar"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["message"], "Detection completed");
    assert_eq!(json["model_used"], "OV-DINO");

    // The 0.4 car is below threshold; only the 0.6 person survives
    let detections = json["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0]["label"], "person");
    assert_eq!(detections[0]["box"][0], 10.0);

    let summary = &json["summary"];
    assert_eq!(summary["total_objects"], 1);
    assert_eq!(summary["unique_labels"], 1);
    // 0.6 lands in the Medium [0.5, 0.7) bucket
    let histogram = summary["confidence_histogram"].as_array().unwrap();
    assert_eq!(histogram[2]["range"], "Medium (0.5-0.7)");
    assert_eq!(histogram[2]["count"], 1);
    assert_eq!(histogram[0]["count"], 0);

    assert!(json["inference_time"].as_f64().unwrap() >= 0.0);
    assert!(json["image_base64"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));

    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_detect_reuses_loaded_model_across_requests() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    for _ in 0..3 {
        let request = multipart_request(vec![
            file_part("file", &png_bytes(64, 64)),
            text_part("model_name", "OV-DINO"),
            text_part("prompts", "person"),
        ]);
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_prompts_is_rejected_without_model_invocation() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = multipart_request(vec![
        file_part("file", &png_bytes(64, 64)),
        text_part("model_name", "OV-DINO"),
        text_part("prompts", "\n   \n\t\n"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error_type"], "validation_error");
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_model_is_rejected_without_loader_call() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = multipart_request(vec![
        file_part("file", &png_bytes(64, 64)),
        text_part("model_name", "Foo"),
        text_part("prompts", "person"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error_type"], "model_not_found");
    assert!(json["error"].as_str().unwrap().contains("OV-DINO"));
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_out_of_range_threshold_is_rejected() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = multipart_request(vec![
        file_part("file", &png_bytes(64, 64)),
        text_part("model_name", "OV-DINO"),
        text_part("confidence_threshold", "1.5"),
        text_part("prompts", "person"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_undecodable_image_is_rejected() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = multipart_request(vec![
        file_part("file", b"definitely not an image"),
        text_part("model_name", "OV-DINO"),
        text_part("prompts", "person"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error_type"], "invalid_image");
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unavailable_model_returns_503_not_fake_results() {
    let registry = DetectorRegistry::new().with_loader(ModelKind::OvDino, || {
        async {
            Err(DetectorError::Unavailable(
                "model file not found".to_string(),
            ))
        }
        .boxed()
    });
    let state = AppState {
        registry: Arc::new(registry),
        annotator: Arc::new(Annotator::new()),
    };
    let app = build_router(state, Duration::from_secs(10));

    let request = multipart_request(vec![
        file_part("file", &png_bytes(64, 64)),
        text_part("model_name", "OV-DINO"),
        text_part("prompts", "person"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = json_body(response).await;
    assert_eq!(json["error_type"], "model_unavailable");
    assert!(json.get("detections").is_none());
}

#[tokio::test]
async fn test_missing_file_field_is_validation_error() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = multipart_request(vec![
        text_part("model_name", "OV-DINO"),
        text_part("prompts", "person"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error_type"], "validation_error");
    assert!(json["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_duplicate_prompts_are_tolerated() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = multipart_request(vec![
        file_part("file", &png_bytes(640, 480)),
        text_part("model_name", "OV-DINO"),
        text_part("confidence_threshold", "0.5"),
        text_part("prompts", "person\nperson\nperson"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let detections = json["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0]["label"], "person");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = stub_router(Arc::new(AtomicUsize::new(0)));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_models_endpoint_reports_load_state() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = stub_router(loads.clone());

    let request = Request::builder()
        .uri("/models")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let json = json_body(response).await;
    let models = json["models"].as_array().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["name"], "OV-DINO");
    assert_eq!(models[0]["loaded"], false);

    // A detect call loads the back end; /models reflects that
    let detect = multipart_request(vec![
        file_part("file", &png_bytes(64, 64)),
        text_part("model_name", "OV-DINO"),
        text_part("prompts", "person"),
    ]);
    app.clone().oneshot(detect).await.unwrap();

    let request = Request::builder()
        .uri("/models")
        .body(Body::empty())
        .unwrap();
    let json = json_body(app.oneshot(request).await.unwrap()).await;
    assert_eq!(json["models"][0]["loaded"], true);
}
