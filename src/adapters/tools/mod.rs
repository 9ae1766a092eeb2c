//! Adapters that drive external command-line tools.

pub mod gpu_probe;
pub mod kaggle_cli;
pub mod yolo_cli;
