//! Router tests for the detection endpoints, driven through `oneshot` with a
//! stub detector in place of the ONNX engine.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use image::{ImageFormat, Rgba, RgbaImage, RgbImage};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

use vehicle_recognition::{
    adapters::{
        http::{router, state::HttpState},
        imaging::preview::JpegPreviewRenderer,
    },
    application::{ports::DetectorPort, services::DetectionService},
    domain::{
        dataset::DatasetDescriptor,
        detection::Detection,
        errors::{DomainError, DomainResult},
        labels::VEHICLE_CLASSES,
        model::{ModelId, YoloParams},
    },
};

const BOUNDARY: &str = "XBOUNDARYX";

struct StubDetector {
    detections: Vec<Detection>,
    seen: Mutex<Vec<(u32, u32)>>,
    fail: bool,
}

impl StubDetector {
    fn new(detections: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self { detections, seen: Mutex::new(vec![]), fail: false })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { detections: vec![], seen: Mutex::new(vec![]), fail: true })
    }
}

impl DetectorPort for StubDetector {
    fn detect(&self, rgb: &RgbImage, params: &YoloParams) -> DomainResult<Vec<Detection>> {
        assert_eq!(params.conf_threshold, 0.25);
        assert_eq!(params.iou_threshold, 0.45);
        self.seen.lock().unwrap().push(rgb.dimensions());
        if self.fail {
            return Err(DomainError::OperationFailed("session run failed".into()));
        }
        Ok(self.detections.clone())
    }
}

fn model_id() -> ModelId {
    ModelId { name: "YOLOv8".into(), onnx_path: PathBuf::from("models/best.onnx") }
}

fn loaded_app(detector: Arc<StubDetector>) -> Router {
    let svc = DetectionService::loaded(
        model_id(),
        YoloParams::default(),
        detector,
        Arc::new(JpegPreviewRenderer::new()),
    );
    router(HttpState::new(Arc::new(svc)))
}

fn unloaded_app() -> Router {
    let svc = DetectionService::unavailable(model_id(), YoloParams::default(), "Model not found");
    router(HttpState::new(Arc::new(svc)))
}

fn sample_detections() -> Vec<Detection> {
    vec![
        Detection { x1: 10.0, y1: 12.5, x2: 60.25, y2: 90.0, score: 0.87, class_id: 9 },
        Detection { x1: 0.0, y1: 0.0, x2: 20.0, y2: 20.0, score: 0.31, class_id: 2 },
        Detection { x1: 5.0, y1: 5.0, x2: 7.5, y2: 9.0, score: 0.26, class_id: 17 },
    ]
}

fn rgba_png(w: u32, h: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, Rgba([200, 30, 30, 100]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn json_request(body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/detect")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn multipart_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let disposition = format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream",
        field, filename
    );
    multipart_body(&disposition, data)
}

fn multipart_text_field(field: &str, value: &str) -> Request<Body> {
    let disposition = format!("Content-Disposition: form-data; name=\"{}\"", field);
    multipart_body(&disposition, value.as_bytes())
}

fn multipart_body(part_headers: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("{}\r\n\r\n", part_headers).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/detect")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, serde_json::from_slice(&body_bytes).expect("body is JSON"))
}

#[tokio::test]
async fn health_reports_model_state() {
    let (status, body) = send(unloaded_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["model_path"], "models/best.onnx");

    let (_, body) = send(loaded_app(StubDetector::new(vec![])), get("/health")).await;
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn classes_match_training_descriptor() {
    let app = unloaded_app();
    let (status, first) = send(app.clone(), get("/classes")).await;
    let (_, second) = send(app, get("/classes")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["count"], 11);
    assert_eq!(first, second);

    let served: Vec<String> = serde_json::from_value(first["classes"].clone()).unwrap();
    assert_eq!(served, VEHICLE_CLASSES.to_vec());
    assert_eq!(served, DatasetDescriptor::for_vehicles("data").names);
}

#[tokio::test]
async fn model_info_depends_on_load_state() {
    let (status, body) = send(unloaded_app(), get("/model-info")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Model not loaded");

    let (status, body) = send(loaded_app(StubDetector::new(vec![])), get("/model-info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["model_type"], "YOLOv8");
    assert_eq!(body["input_size"], 640);
    assert_eq!(body["num_classes"], 11);
}

#[tokio::test]
async fn detect_without_model_is_500_even_for_valid_input() {
    let b64 = BASE64_STANDARD.encode(rgba_png(10, 10));
    let (status, body) = send(unloaded_app(), json_request(format!(r#"{{"image":"{}"}}"#, b64))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    let (status, _) = send(unloaded_app(), json_request("{}".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn detect_without_image_is_400() {
    let app = loaded_app(StubDetector::new(sample_detections()));

    let (status, body) = send(app.clone(), json_request("{}".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(app.clone(), multipart_request("other", "x.png", &rgba_png(4, 4))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let plain = Request::builder()
        .method(Method::POST)
        .uri("/detect")
        .body(Body::from("hello"))
        .unwrap();
    let (status, _) = send(app, plain).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_multipart_file_is_no_file_selected() {
    let app = loaded_app(StubDetector::new(vec![]));
    let (status, body) = send(app, multipart_request("image", "", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No file selected");
}

#[tokio::test]
async fn rgba_png_as_plain_base64_is_converted_and_sized() {
    let detector = StubDetector::new(sample_detections());
    let app = loaded_app(detector.clone());
    let b64 = BASE64_STANDARD.encode(rgba_png(100, 100));

    let (status, body) = send(app, json_request(format!(r#"{{"image":"{}"}}"#, b64))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["image_size"]["width"], 100);
    assert_eq!(body["image_size"]["height"], 100);
    assert_eq!(detector.seen.lock().unwrap().as_slice(), &[(100u32, 100u32)]);

    let detections = body["detections"].as_array().unwrap();
    assert_eq!(body["count"].as_u64().unwrap() as usize, detections.len());
    for d in detections {
        let b = &d["bbox"];
        let (x1, x2) = (b["x1"].as_f64().unwrap() as f32, b["x2"].as_f64().unwrap() as f32);
        let (y1, y2) = (b["y1"].as_f64().unwrap() as f32, b["y2"].as_f64().unwrap() as f32);
        assert_eq!(b["width"].as_f64().unwrap() as f32, x2 - x1);
        assert_eq!(b["height"].as_f64().unwrap() as f32, y2 - y1);

        let id = d["class_id"].as_u64().unwrap() as usize;
        let expected = VEHICLE_CLASSES
            .get(id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("class_{}", id));
        assert_eq!(d["class"], expected.as_str());
        assert!(d["confidence"].as_f64().unwrap() >= 0.0);
    }
    assert!(body["annotated_image"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn data_url_prefix_is_stripped() {
    let app = loaded_app(StubDetector::new(vec![]));
    let b64 = BASE64_STANDARD.encode(rgba_png(3, 2));
    let (status, body) = send(
        app,
        json_request(format!(r#"{{"image":"data:image/png;base64,{}"}}"#, b64)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["image_size"]["width"], 3);
    assert_eq!(body["image_size"]["height"], 2);
}

#[tokio::test]
async fn line_wrapped_base64_is_detected() {
    let detector = StubDetector::new(vec![]);
    let app = loaded_app(detector.clone());
    let b64 = BASE64_STANDARD.encode(rgba_png(40, 30));
    let wrapped = b64
        .as_bytes()
        .chunks(76)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    let body = serde_json::json!({ "image": wrapped }).to_string();

    let (status, body) = send(app, json_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image_size"]["width"], 40);
    assert_eq!(body["image_size"]["height"], 30);
    assert_eq!(detector.seen.lock().unwrap().as_slice(), &[(40u32, 30u32)]);
}

#[tokio::test]
async fn multipart_text_field_is_not_an_upload() {
    let detector = StubDetector::new(sample_detections());
    let app = loaded_app(detector.clone());
    let b64 = BASE64_STANDARD.encode(rgba_png(8, 8));

    let (status, body) = send(app, multipart_text_field("image", &b64)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "missing_input");
    assert_eq!(
        body["error"],
        "No image provided. Send as multipart/form-data or base64 JSON."
    );
    assert!(detector.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn multipart_upload_is_detected() {
    let detector = StubDetector::new(sample_detections());
    let app = loaded_app(detector.clone());
    let (status, body) = send(app, multipart_request("image", "tank.png", &rgba_png(64, 48))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["detections"][0]["class"], "tank");
    assert_eq!(body["detections"][2]["class"], "class_17");
    assert_eq!(detector.seen.lock().unwrap().as_slice(), &[(64u32, 48u32)]);
}

#[tokio::test]
async fn undecodable_image_is_a_client_error() {
    let app = loaded_app(StubDetector::new(vec![]));

    let (status, body) = send(app.clone(), json_request(r#"{"image":"@@not-base64@@"}"#.into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "decode");

    let garbage = BASE64_STANDARD.encode(b"definitely not an image");
    let (status, body) = send(app.clone(), json_request(format!(r#"{{"image":"{}"}}"#, garbage))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "decode");

    let (status, _) = send(app, multipart_request("image", "x.png", b"garbage bytes")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn inference_failure_is_500_with_message() {
    let app = loaded_app(StubDetector::failing());
    let b64 = BASE64_STANDARD.encode(rgba_png(8, 8));
    let (status, body) = send(app, json_request(format!(r#"{{"image":"{}"}}"#, b64))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "inference");
    assert!(body["error"].as_str().unwrap().contains("session run failed"));
}
