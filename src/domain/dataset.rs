use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::labels;

/// A dataset to fetch: remote identifier, target directory under the raw
/// data root, and the minimum number of files expected after download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub output_dir: String,
    pub min_files: usize,
}

pub fn default_datasets() -> Vec<DatasetSpec> {
    vec![
        DatasetSpec {
            name: "dataclusterlabs/indian-vehicle-dataset".into(),
            output_dir: "indian-vehicle-dataset".into(),
            min_files: 1000,
        },
        DatasetSpec {
            name: "rawsi18/military-assets-dataset-12-classes-yolo8-format".into(),
            output_dir: "military-assets-dataset".into(),
            min_files: 1000,
        },
    ]
}

/// Training descriptor in the layout the YOLO trainer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub path: PathBuf,
    pub train: String,
    pub val: String,
    pub test: String,
    pub nc: usize,
    pub names: Vec<String>,
}

impl DatasetDescriptor {
    pub fn for_vehicles(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into(),
            train: "images/train".into(),
            val: "images/val".into(),
            test: "images/test".into(),
            nc: labels::num_classes(),
            names: labels::class_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOutcome {
    pub name: String,
    pub downloaded: bool,
    pub verified: bool,
    pub file_count: usize,
    /// Images with no YOLO label file next to them. Informational only.
    pub unpaired_images: usize,
}

impl DatasetOutcome {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), downloaded: false, verified: false, file_count: 0, unpaired_images: 0 }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionReport {
    pub datasets: Vec<DatasetOutcome>,
}

impl CollectionReport {
    pub fn success(&self) -> bool {
        self.datasets.iter().all(|d| d.downloaded && d.verified)
    }

    pub fn failed(&self) -> Vec<&DatasetOutcome> {
        self.datasets.iter().filter(|d| !(d.downloaded && d.verified)).collect()
    }
}
