//! Military vehicle recognition: dataset collection, YOLO training driver
//! and an HTTP detection service over an ONNX export of the trained model.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod telemetry;
