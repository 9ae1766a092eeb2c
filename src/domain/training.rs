use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    N,
    S,
    M,
    L,
    X,
}

impl ModelSize {
    pub fn suffix(self) -> &'static str {
        match self {
            ModelSize::N => "n",
            ModelSize::S => "s",
            ModelSize::M => "m",
            ModelSize::L => "l",
            ModelSize::X => "x",
        }
    }
}

impl FromStr for ModelSize {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" => Ok(ModelSize::N),
            "s" => Ok(ModelSize::S),
            "m" => Ok(ModelSize::M),
            "l" => Ok(ModelSize::L),
            "x" => Ok(ModelSize::X),
            other => Err(DomainError::InvalidInput(format!(
                "unknown model size '{}', expected one of n, s, m, l, x",
                other
            ))),
        }
    }
}

/// Requested compute device. `Auto` is resolved by probing before training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Cpu,
    Cuda,
}

impl FromStr for DevicePreference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "cpu" => Ok(DevicePreference::Cpu),
            "cuda" | "gpu" => Ok(DevicePreference::Cuda),
            other => Err(DomainError::InvalidInput(format!("unknown device '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }

    pub fn default_batch(self) -> u32 {
        match self {
            Device::Cuda => 16,
            Device::Cpu => 8,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full hyper-parameter set forwarded to the trainer.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingPlan {
    pub descriptor: PathBuf,
    pub size: ModelSize,
    pub epochs: u32,
    pub imgsz: u32,
    pub device: Device,
    pub batch: u32,
    pub project: PathBuf,
    pub name: String,
}

impl TrainingPlan {
    pub fn new(descriptor: impl Into<PathBuf>, size: ModelSize, epochs: u32, imgsz: u32, device: Device) -> Self {
        Self {
            descriptor: descriptor.into(),
            size,
            epochs,
            imgsz,
            device,
            batch: device.default_batch(),
            project: PathBuf::from("runs/train"),
            name: format!("military_vehicle_yolov8{}", size.suffix()),
        }
    }

    pub fn base_model(&self) -> String {
        format!("yolov8{}.pt", self.size.suffix())
    }

    pub fn best_weights(&self) -> PathBuf {
        self.project.join(&self.name).join("weights").join("best.pt")
    }

    /// Trainer arguments in `key=value` form.
    pub fn to_args(&self) -> Vec<String> {
        let fixed: [(&str, String); 28] = [
            ("workers", "4".into()),
            ("patience", "20".into()),
            ("save", "True".into()),
            ("save_period", "10".into()),
            ("cache", "False".into()),
            ("exist_ok", "True".into()),
            ("pretrained", "True".into()),
            ("optimizer", "AdamW".into()),
            ("verbose", "True".into()),
            ("seed", "42".into()),
            ("deterministic", "True".into()),
            ("single_cls", "False".into()),
            ("rect", "False".into()),
            ("cos_lr", "True".into()),
            ("close_mosaic", "10".into()),
            ("resume", "False".into()),
            ("amp", "True".into()),
            ("fraction", "1.0".into()),
            ("profile", "False".into()),
            ("overlap_mask", "True".into()),
            ("mask_ratio", "4".into()),
            ("dropout", "0.0".into()),
            ("val", "True".into()),
            ("plots", "True".into()),
            ("model", self.base_model()),
            ("project", self.project.display().to_string()),
            ("name", self.name.clone()),
            ("data", self.descriptor.display().to_string()),
        ];

        let mut args = vec![
            format!("epochs={}", self.epochs),
            format!("imgsz={}", self.imgsz),
            format!("batch={}", self.batch),
            format!("device={}", self.device_arg()),
        ];
        args.extend(fixed.iter().map(|(k, v)| format!("{}={}", k, v)));
        args
    }

    fn device_arg(&self) -> &'static str {
        match self.device {
            Device::Cuda => "0",
            Device::Cpu => "cpu",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationMetrics {
    pub map50: f64,
    pub map50_95: f64,
}

/// Per-format export results; a failure in one format never hides the others.
pub type ExportResults = BTreeMap<String, Result<PathBuf, String>>;

/// Conventional location of an export written next to the weights file.
pub fn export_path_for(weights: &Path, format: &str) -> PathBuf {
    let ext = match format {
        "onnx" => "onnx",
        "torchscript" => "torchscript",
        "engine" => "engine",
        "tflite" => "tflite",
        "openvino" => return weights.with_file_name(openvino_dir(weights)),
        other => other,
    };
    weights.with_extension(ext)
}

fn openvino_dir(weights: &Path) -> String {
    let stem = weights.file_stem().and_then(|s| s.to_str()).unwrap_or("model");
    format!("{}_openvino_model", stem)
}
