use image::RgbImage;

use crate::adapters::imaging::{annotate::annotate, codec};
use crate::application::ports::PreviewRendererPort;
use crate::domain::detection::Detection;
use crate::domain::errors::{DomainError, DomainResult};

/// Annotated JPEG preview, returned as a `data:image/jpeg;base64,` URL.
pub struct JpegPreviewRenderer {
    quality: u8,
}

impl JpegPreviewRenderer {
    pub fn new() -> Self {
        Self { quality: codec::PREVIEW_JPEG_QUALITY }
    }
}

impl Default for JpegPreviewRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewRendererPort for JpegPreviewRenderer {
    fn render(&self, rgb: &RgbImage, detections: &[Detection]) -> DomainResult<String> {
        let annotated = annotate(rgb, detections);
        codec::jpeg_data_url(&annotated, self.quality)
            .map_err(|e| DomainError::OperationFailed(e.to_string()))
    }
}
