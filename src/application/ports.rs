use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::domain::{
    dataset::DatasetSpec,
    detection::Detection,
    errors::DomainResult,
    model::{ModelId, YoloParams},
    training::{Device, TrainingPlan, ValidationMetrics},
};

/// Loaded object detector. Implementations are read-only after construction.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, rgb: &RgbImage, params: &YoloParams) -> DomainResult<Vec<Detection>>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

#[async_trait]
pub trait DatasetDownloaderPort: Send + Sync {
    async fn download(&self, dataset: &DatasetSpec, dest: &Path) -> DomainResult<()>;
}

#[async_trait]
pub trait TrainerPort: Send + Sync {
    /// Runs training and returns the path of the best weights.
    async fn train(&self, plan: &TrainingPlan) -> DomainResult<PathBuf>;
    async fn validate(&self, weights: &Path, descriptor: &Path) -> DomainResult<ValidationMetrics>;
    async fn export(&self, weights: &Path, format: &str) -> DomainResult<PathBuf>;
}

pub trait ComputeProbePort: Send + Sync {
    fn detect_device(&self) -> Device;
}

/// Draws detections onto the image and returns it as a data URL.
pub trait PreviewRendererPort: Send + Sync {
    fn render(&self, rgb: &RgbImage, detections: &[Detection]) -> DomainResult<String>;
}
