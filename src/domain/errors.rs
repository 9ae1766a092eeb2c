use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure kinds of a single detection request.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Model not loaded. Please check server logs.")]
    ModelUnavailable,
    #[error("No file selected")]
    NoFileSelected,
    #[error("No image provided. Send as multipart/form-data or base64 JSON.")]
    NoImage,
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Inference(String),
    #[error("{0}")]
    Encoding(String),
}

impl DetectError {
    /// Input problems the client can fix by sending a different request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NoFileSelected | Self::NoImage | Self::Decode(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::NoFileSelected | Self::NoImage => "missing_input",
            Self::Decode(_) => "decode",
            Self::Inference(_) => "inference",
            Self::Encoding(_) => "encoding",
        }
    }
}
