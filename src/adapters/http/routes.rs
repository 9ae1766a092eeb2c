use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use image::DynamicImage;
use tracing::{debug, error, warn};

use crate::adapters::http::state::HttpState;
use crate::adapters::imaging::codec::{decode_base64_image, decode_image_bytes};
use crate::application::dto::{DetectJsonRequest, DetectResponse, ErrorResponse};
use crate::domain::errors::DetectError;

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse::new(self.to_string()).with_kind(self.kind());
        (status, Json(body)).into_response()
    }
}

pub async fn health(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.detection.health())
}

pub async fn classes(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.detection.classes())
}

pub async fn model_info(State(st): State<HttpState>) -> Response {
    match st.detection.model_info() {
        Some(info) => Json(info).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Model not loaded")),
        )
            .into_response(),
    }
}

/// POST /detect - accepts a multipart `image` file or `{"image": "<base64>"}`.
pub async fn detect(State(st): State<HttpState>, req: Request) -> Response {
    match run_detect(st, req).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => {
            if e.is_client_error() {
                warn!("detect rejected: {}", e);
            } else {
                error!("detect failed: {}", e);
            }
            e.into_response()
        }
    }
}

async fn run_detect(st: HttpState, req: Request) -> Result<DetectResponse, DetectError> {
    // An unloaded model fails the request before the input is even read.
    st.detection.ensure_loaded()?;

    let image = extract_image(req).await?;
    debug!("decoded upload {}x{}", image.width(), image.height());

    let svc = st.detection.clone();
    tokio::task::spawn_blocking(move || svc.detect(image))
        .await
        .map_err(|e| DetectError::Inference(e.to_string()))?
}

async fn extract_image(req: Request) -> Result<DynamicImage, DetectError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| DetectError::Decode(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| DetectError::Decode(e.to_string()))?
        {
            // Only file parts count; a plain `image` form value is ignored.
            if field.name() != Some("image") || field.file_name().is_none() {
                continue;
            }
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| DetectError::Decode(e.to_string()))?;
            if file_name.is_empty() || bytes.is_empty() {
                return Err(DetectError::NoFileSelected);
            }
            return decode_image_bytes(&bytes).map_err(|e| DetectError::Decode(e.to_string()));
        }
        return Err(DetectError::NoImage);
    }

    if content_type.starts_with("application/json") {
        let Json(body) = Json::<DetectJsonRequest>::from_request(req, &())
            .await
            .map_err(|e| DetectError::Decode(e.body_text()))?;
        if let Some(data) = body.image {
            return decode_base64_image(&data).map_err(|e| DetectError::Decode(e.to_string()));
        }
    }

    Err(DetectError::NoImage)
}
