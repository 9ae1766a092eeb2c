use async_trait::async_trait;

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

/// Checks that a weight file is present and looks like an ONNX export
/// before the engine tries to load it.
pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

impl Default for OnnxModelCatalog {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.as_os_str().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        let meta = tokio::fs::metadata(&model.onnx_path).await.map_err(|_| {
            DomainError::NotFound(format!("Model not found at {}", model.onnx_path.display()))
        })?;
        if !meta.is_file() || meta.len() == 0 {
            return Err(DomainError::InvalidInput(format!(
                "weight file is empty or not a file: {}",
                model.onnx_path.display()
            )));
        }
        if model.onnx_path.extension().and_then(|e| e.to_str()) != Some("onnx") {
            return Err(DomainError::InvalidInput(format!(
                "expected an .onnx export, got {}",
                model.onnx_path.display()
            )));
        }
        Ok(())
    }
}
