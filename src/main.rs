use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::services::ServeDir;

use vehicle_recognition::{
    adapters::{
        http::{router, state::HttpState},
        imaging::preview::JpegPreviewRenderer,
        onnx::{model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
    },
    application::{ports::DetectorPort, services::{DetectionService, MODEL_TYPE}},
    config::AppConfig,
    domain::model::ModelId,
    telemetry,
};

#[derive(Parser, Debug)]
#[command(name = "vehicle-recognition", about = "Military vehicle detection HTTP service")]
struct Args {
    /// Address to listen on.
    #[arg(long)]
    bind: Option<String>,
    /// ONNX weight file to load at startup.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Directory with the web frontend.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging (RUST_LOG, info by default)
    telemetry::init();
    let args = Args::parse();
    let cfg = AppConfig::load();

    let model_path = cfg.resolve(&args.model.unwrap_or_else(|| cfg.server.model_path.clone()));
    let static_dir = cfg.resolve(&args.static_dir.unwrap_or_else(|| cfg.server.static_dir.clone()));
    let addr = args.bind.unwrap_or_else(|| cfg.server.bind_addr.clone());

    // 2. Load the model once; a failure leaves the service in degraded mode.
    tracing::info!("🔧 Loading detection model...");
    let model = ModelId { name: MODEL_TYPE.into(), onnx_path: model_path };
    let detection = DetectionService::bootstrap(
        model,
        cfg.server.yolo_params(),
        &OnnxModelCatalog::new(),
        Arc::new(JpegPreviewRenderer::new()),
        |path| Ok(Arc::new(OnnxYoloEngine::load(path)?) as Arc<dyn DetectorPort>),
    )
    .await;

    // 3. Router + static frontend
    let state = HttpState::new(Arc::new(detection));
    let app = router(state).fallback_service(ServeDir::new(&static_dir));

    // 4. Serve
    tracing::info!("🚀 Detection server listening on http://{}", addr);
    tracing::info!("📂 Static files served from {}", static_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
