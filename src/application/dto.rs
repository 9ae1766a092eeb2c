use serde::{Deserialize, Serialize};

use crate::domain::detection::DetectionRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectJsonRequest {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub success: bool,
    pub detections: Vec<DetectionRecord>,
    pub count: usize,
    pub annotated_image: String,
    pub image_size: ImageSize,
}

impl DetectResponse {
    pub fn new(detections: Vec<DetectionRecord>, annotated_image: String, image_size: ImageSize) -> Self {
        Self {
            success: true,
            count: detections.len(),
            detections,
            annotated_image,
            image_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { success: false, error: error.into(), kind: None }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_path: String,
    pub yolo_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassesResponse {
    pub classes: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub success: bool,
    pub model_type: String,
    pub model_path: String,
    pub classes: Vec<String>,
    pub num_classes: usize,
    pub input_size: u32,
    pub framework: String,
}
