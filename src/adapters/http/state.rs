use std::sync::Arc;
use crate::application::services::DetectionService;

/// Shared state for the Axum handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Detection use case, loaded once at startup.
    pub detection: Arc<DetectionService>,
}

impl HttpState {
    pub fn new(detection: Arc<DetectionService>) -> Self {
        Self { detection }
    }
}
