use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    dataset::{default_datasets, DatasetSpec},
    model::YoloParams,
    training::{DevicePreference, ModelSize},
};

pub const DEFAULT_CONFIG_NAME: &str = "vehicle-recognition.toml";
pub const CONFIG_ENV: &str = "VEHICLE_RECOGNITION_CONFIG";

/// Settings shared by the server, the collector and the training driver.
/// Relative paths are resolved against `project_root`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub project_root: PathBuf,
    pub server: ServerConfig,
    pub collector: CollectorConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub model_path: PathBuf,
    pub static_dir: PathBuf,
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub kaggle_bin: PathBuf,
    pub credentials_file: PathBuf,
    pub data_dir: PathBuf,
    pub datasets: Vec<DatasetSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub yolo_bin: PathBuf,
    pub data_dir: PathBuf,
    pub descriptor: PathBuf,
    pub model_size: ModelSize,
    pub epochs: u32,
    pub imgsz: u32,
    pub device: DevicePreference,
    pub export_formats: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            server: ServerConfig::default(),
            collector: CollectorConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let params = YoloParams::default();
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            model_path: PathBuf::from("models/best.onnx"),
            static_dir: PathBuf::from("static"),
            input_size: params.input_size,
            conf_threshold: params.conf_threshold,
            iou_threshold: params.iou_threshold,
            max_detections: params.max_detections,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            kaggle_bin: PathBuf::from("kaggle"),
            credentials_file: PathBuf::from("kaggle.json"),
            data_dir: PathBuf::from("data/raw"),
            datasets: default_datasets(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            yolo_bin: PathBuf::from("yolo"),
            data_dir: PathBuf::from("data"),
            descriptor: PathBuf::from("models/dataset.yaml"),
            model_size: ModelSize::M,
            epochs: 100,
            imgsz: 640,
            device: DevicePreference::Auto,
            export_formats: vec!["onnx".into()],
        }
    }
}

impl ServerConfig {
    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.input_size,
            conf_threshold: self.conf_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }
}

impl AppConfig {
    /// Reads `$VEHICLE_RECOGNITION_CONFIG`, else `vehicle-recognition.toml`
    /// in the working directory, else defaults. A broken file is reported
    /// and replaced by defaults.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME));
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("⚠️  ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parse {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Resolves a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.yolo_params(), YoloParams::default());
        assert_eq!(cfg.server.model_path, PathBuf::from("models/best.onnx"));
        assert_eq!(cfg.collector.datasets.len(), 2);
        assert_eq!(cfg.training.epochs, 100);
        assert_eq!(cfg.training.device, DevicePreference::Auto);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
project_root = "/srv/vehicles"

[server]
bind_addr = "127.0.0.1:8090"

[training]
model_size = "s"
device = "cpu"
export_formats = ["onnx", "torchscript"]

[[collector.datasets]]
name = "owner/only"
output_dir = "only"
min_files = 10
"#,
        )
        .unwrap();

        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8090");
        assert_eq!(cfg.server.conf_threshold, 0.25);
        assert_eq!(cfg.training.model_size, ModelSize::S);
        assert_eq!(cfg.training.device, DevicePreference::Cpu);
        assert_eq!(cfg.training.export_formats.len(), 2);
        assert_eq!(cfg.collector.datasets.len(), 1);
        assert_eq!(cfg.collector.kaggle_bin, PathBuf::from("kaggle"));
        assert_eq!(
            cfg.resolve(&cfg.server.model_path),
            PathBuf::from("/srv/vehicles/models/best.onnx")
        );
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "server = 3").unwrap();
        assert!(AppConfig::from_path(&path).is_err());
    }
}
