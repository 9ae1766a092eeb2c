use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::{
    application::{
        dto::{ClassesResponse, DetectResponse, HealthResponse, ImageSize, ModelInfoResponse},
        ports::{
            ComputeProbePort, DatasetDownloaderPort, DetectorPort, ModelCatalogPort, PreviewRendererPort,
            TrainerPort,
        },
    },
    domain::{
        dataset::{CollectionReport, DatasetDescriptor, DatasetOutcome, DatasetSpec},
        detection::DetectionRecord,
        errors::{DetectError, DomainError, DomainResult},
        labels,
        model::{ModelId, ModelStatus, YoloParams},
        training::{Device, DevicePreference, ExportResults, TrainingPlan, ValidationMetrics},
    },
};

pub const MODEL_TYPE: &str = "YOLOv8";
pub const FRAMEWORK: &str = "ONNX Runtime (Ultralytics YOLOv8 export)";

/// Detection use case. Built once at startup and shared read-only by every
/// request; whether the model loaded is decided here and never revisited.
pub struct DetectionService {
    model: ModelId,
    params: YoloParams,
    engine: Option<Engine>,
    status: ModelStatus,
}

struct Engine {
    detector: Arc<dyn DetectorPort>,
    renderer: Arc<dyn PreviewRendererPort>,
}

impl DetectionService {
    pub fn loaded(
        model: ModelId,
        params: YoloParams,
        detector: Arc<dyn DetectorPort>,
        renderer: Arc<dyn PreviewRendererPort>,
    ) -> Self {
        Self {
            model,
            params,
            engine: Some(Engine { detector, renderer }),
            status: ModelStatus::Loaded,
        }
    }

    pub fn unavailable(model: ModelId, params: YoloParams, reason: impl Into<String>) -> Self {
        Self { model, params, engine: None, status: ModelStatus::Unavailable(reason.into()) }
    }

    /// Validates the weight file and runs `load` on it. Any failure leaves the
    /// service in the unavailable state instead of aborting startup.
    pub async fn bootstrap<F>(
        model: ModelId,
        params: YoloParams,
        catalog: &dyn ModelCatalogPort,
        renderer: Arc<dyn PreviewRendererPort>,
        load: F,
    ) -> Self
    where
        F: FnOnce(&Path) -> anyhow::Result<Arc<dyn DetectorPort>>,
    {
        if let Err(e) = catalog.validate_model(&model).await {
            warn!("⚠️  {}", e);
            return Self::unavailable(model, params, e.to_string());
        }
        match load(&model.onnx_path) {
            Ok(detector) => {
                info!("✓ Loaded {} model from {}", model.name, model.onnx_path.display());
                Self::loaded(model, params, detector, renderer)
            }
            Err(e) => {
                error!("❌ Failed to load model: {:#}", e);
                Self::unavailable(model, params, format!("{:#}", e))
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status.is_loaded()
    }

    pub fn model_path(&self) -> String {
        self.model.onnx_path.display().to_string()
    }

    pub fn ensure_loaded(&self) -> Result<&dyn DetectorPort, DetectError> {
        self.engine().map(|engine| engine.detector.as_ref())
    }

    fn engine(&self) -> Result<&Engine, DetectError> {
        self.engine.as_ref().ok_or_else(|| {
            if let ModelStatus::Unavailable(reason) = &self.status {
                debug!("refusing detection, model unavailable: {}", reason);
            }
            DetectError::ModelUnavailable
        })
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".into(),
            model_loaded: self.is_loaded(),
            model_path: self.model_path(),
            yolo_available: true,
        }
    }

    pub fn classes(&self) -> ClassesResponse {
        ClassesResponse { classes: labels::class_names(), count: labels::num_classes() }
    }

    pub fn model_info(&self) -> Option<ModelInfoResponse> {
        if !self.is_loaded() {
            return None;
        }
        Some(ModelInfoResponse {
            success: true,
            model_type: MODEL_TYPE.into(),
            model_path: self.model_path(),
            classes: labels::class_names(),
            num_classes: labels::num_classes(),
            input_size: self.params.input_size,
            framework: FRAMEWORK.into(),
        })
    }

    /// Runs the model on one decoded image and builds the client response.
    pub fn detect(&self, image: DynamicImage) -> Result<DetectResponse, DetectError> {
        let engine = self.engine()?;

        // Any colour mode (RGBA, grayscale, 16-bit, ...) becomes 8-bit RGB.
        let rgb = image.into_rgb8();
        let image_size = ImageSize { width: rgb.width(), height: rgb.height() };

        let detections = engine
            .detector
            .detect(&rgb, &self.params)
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        let records: Vec<DetectionRecord> = detections.iter().map(DetectionRecord::from).collect();

        let annotated_image = engine
            .renderer
            .render(&rgb, &detections)
            .map_err(|e| DetectError::Encoding(e.to_string()))?;

        info!("🎯 {} detections on {}x{} image", records.len(), image_size.width, image_size.height);
        Ok(DetectResponse::new(records, annotated_image, image_size))
    }
}

/// Downloads the configured datasets and checks they look complete.
pub struct DatasetCollector {
    downloader: Arc<dyn DatasetDownloaderPort>,
    data_dir: PathBuf,
    credentials: PathBuf,
    datasets: Vec<DatasetSpec>,
}

impl DatasetCollector {
    pub fn new(
        downloader: Arc<dyn DatasetDownloaderPort>,
        data_dir: impl Into<PathBuf>,
        credentials: impl Into<PathBuf>,
        datasets: Vec<DatasetSpec>,
    ) -> Self {
        Self {
            downloader,
            data_dir: data_dir.into(),
            credentials: credentials.into(),
            datasets,
        }
    }

    pub fn check_credentials(&self) -> bool {
        if !self.credentials.is_file() {
            error!("❌ {} not found.", self.credentials.display());
            error!("   Download your Kaggle API token and place it in the project root.");
            return false;
        }
        info!("✓ Kaggle credentials found.");
        true
    }

    pub async fn download_dataset(&self, dataset: &DatasetSpec) -> bool {
        let output_path = self.data_dir.join(&dataset.output_dir);
        if let Err(e) = tokio::fs::create_dir_all(&output_path).await {
            error!("✗ Cannot create {}: {}", output_path.display(), e);
            return false;
        }

        info!("⬇️  Downloading {}...", dataset.name);
        match self.downloader.download(dataset, &output_path).await {
            Ok(()) => {
                info!("✓ Successfully downloaded {}", dataset.name);
                true
            }
            Err(e) => {
                error!("✗ Failed to download {}: {}", dataset.name, e);
                false
            }
        }
    }

    /// True when `output_dir` exists and holds at least `min_files` regular
    /// files, nested files included.
    pub fn verify_dataset(&self, output_dir: &str, min_files: usize) -> bool {
        let full_path = self.data_dir.join(output_dir);
        if !full_path.exists() {
            error!("✗ Dataset not found: {}", output_dir);
            return false;
        }

        let file_count = count_files(&full_path);
        if file_count < min_files {
            error!(
                "✗ Dataset verification failed: only {} files found (expected at least {})",
                file_count, min_files
            );
            return false;
        }

        info!("✓ Dataset verified: {} files found in {}", file_count, output_dir);
        true
    }

    /// Downloads every dataset, then verifies every dataset. A failing dataset
    /// never stops its siblings; partial downloads are left in place.
    pub async fn collect_all(&self, verify_only: bool) -> DomainResult<CollectionReport> {
        if !verify_only && !self.check_credentials() {
            return Err(DomainError::NotFound(format!(
                "credentials file {}",
                self.credentials.display()
            )));
        }

        let mut report = CollectionReport::default();
        for dataset in &self.datasets {
            let mut outcome = DatasetOutcome::new(&dataset.name);
            outcome.downloaded = verify_only || self.download_dataset(dataset).await;
            report.datasets.push(outcome);
        }

        info!("🔎 Verifying downloaded datasets");
        for (dataset, outcome) in self.datasets.iter().zip(report.datasets.iter_mut()) {
            outcome.verified = self.verify_dataset(&dataset.output_dir, dataset.min_files);

            let root = self.data_dir.join(&dataset.output_dir);
            outcome.file_count = count_files(&root);
            outcome.unpaired_images = count_unpaired_images(&root);
            if outcome.unpaired_images > 0 {
                warn!(
                    "⚠️  {} images in {} have no matching label file",
                    outcome.unpaired_images, dataset.output_dir
                );
            }
        }

        if report.success() {
            info!("✓ All datasets downloaded and verified successfully!");
        } else {
            for failed in report.failed() {
                error!("✗ {} failed to download or verify", failed.name);
            }
        }
        Ok(report)
    }
}

pub fn count_files(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Counts images under an `images/` directory with no `labels/<stem>.txt`
/// sibling, following the YOLO layout.
pub fn count_unpaired_images(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .map(|x| IMAGE_EXTENSIONS.contains(&x.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .filter_map(|e| label_path_for(e.path()))
        .filter(|label| !label.exists())
        .count()
}

fn label_path_for(image: &Path) -> Option<PathBuf> {
    let mut saw_images = false;
    let mut label: PathBuf = image
        .components()
        .map(|c| {
            if !saw_images && c.as_os_str() == "images" {
                saw_images = true;
                std::ffi::OsStr::new("labels").to_os_string()
            } else {
                c.as_os_str().to_os_string()
            }
        })
        .collect();
    if !saw_images {
        return None;
    }
    label.set_extension("txt");
    Some(label)
}

/// Training use case: descriptor, trainer run, validation and exports.
pub struct TrainingDriver {
    trainer: Arc<dyn TrainerPort>,
    probe: Arc<dyn ComputeProbePort>,
}

impl TrainingDriver {
    pub fn new(trainer: Arc<dyn TrainerPort>, probe: Arc<dyn ComputeProbePort>) -> Self {
        Self { trainer, probe }
    }

    pub fn write_descriptor(&self, data_dir: &Path, output_path: &Path) -> DomainResult<DatasetDescriptor> {
        let descriptor = DatasetDescriptor::for_vehicles(data_dir);
        let yaml = serde_yaml::to_string(&descriptor)
            .map_err(|e| DomainError::OperationFailed(format!("serialize descriptor: {}", e)))?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::OperationFailed(format!("create {}: {}", parent.display(), e)))?;
        }
        std::fs::write(output_path, yaml)
            .map_err(|e| DomainError::OperationFailed(format!("write {}: {}", output_path.display(), e)))?;

        info!("✓ Created dataset configuration: {}", output_path.display());
        Ok(descriptor)
    }

    pub fn resolve_device(&self, preference: DevicePreference) -> Device {
        let device = match preference {
            DevicePreference::Cpu => Device::Cpu,
            DevicePreference::Cuda => Device::Cuda,
            DevicePreference::Auto => self.probe.detect_device(),
        };
        info!("🖥️  Device: {}", device);
        if device == Device::Cpu {
            warn!("⚠️  Training on CPU. This will be slow; use a GPU-enabled environment for production.");
        }
        device
    }

    pub async fn train(&self, plan: &TrainingPlan) -> DomainResult<PathBuf> {
        info!("🚀 Training YOLOv8-{} model", plan.size.suffix());
        info!(
            "   epochs={} imgsz={} batch={} device={} optimizer=AdamW",
            plan.epochs, plan.imgsz, plan.batch, plan.device
        );
        match self.trainer.train(plan).await {
            Ok(best) => {
                info!("✓ Best model saved to: {}", best.display());
                Ok(best)
            }
            Err(e) => {
                error!("❌ Training failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn validate(&self, weights: &Path, descriptor: &Path) -> DomainResult<ValidationMetrics> {
        info!("📏 Validating {}", weights.display());
        let metrics = self.trainer.validate(weights, descriptor).await?;
        info!("   mAP50: {:.4}", metrics.map50);
        info!("   mAP50-95: {:.4}", metrics.map50_95);
        Ok(metrics)
    }

    /// Exports to each format independently.
    pub async fn export(&self, weights: &Path, formats: &[String]) -> ExportResults {
        let mut results = ExportResults::new();
        for fmt in formats {
            info!("📦 Exporting to {}...", fmt.to_uppercase());
            let outcome = match self.trainer.export(weights, fmt).await {
                Ok(path) => {
                    info!("✓ Exported to: {}", path.display());
                    Ok(path)
                }
                Err(e) => {
                    error!("❌ Failed to export to {}: {}", fmt, e);
                    Err(e.to_string())
                }
            };
            results.insert(fmt.clone(), outcome);
        }
        results
    }

    /// Copies an exported model to the path the detection service loads.
    pub fn install(&self, exported: &Path, destination: &Path) -> DomainResult<()> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::OperationFailed(format!("create {}: {}", parent.display(), e)))?;
        }
        std::fs::copy(exported, destination).map_err(|e| {
            DomainError::OperationFailed(format!(
                "copy {} -> {}: {}",
                exported.display(),
                destination.display(),
                e
            ))
        })?;
        info!("✓ Model ready at: {}", destination.display());
        Ok(())
    }
}

/// Runs `fut` and logs the elapsed time.
pub async fn timed<T, F: Future<Output = T>>(label: &str, fut: F) -> T {
    let start = std::time::Instant::now();
    let out = fut.await;
    info!("⏱️  {} took {:.1}s", label, start.elapsed().as_secs_f32());
    out
}
