use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use vehicle_recognition::{
    adapters::tools::{gpu_probe::NvidiaSmiProbe, yolo_cli::YoloCli},
    application::services::{timed, TrainingDriver},
    config::AppConfig,
    domain::training::{DevicePreference, ModelSize, TrainingPlan},
    telemetry,
};

#[derive(Parser, Debug)]
#[command(name = "train-model", about = "Train, validate and export the vehicle detector")]
struct Args {
    /// Model size: n, s, m, l or x.
    #[arg(long)]
    size: Option<ModelSize>,
    #[arg(long)]
    epochs: Option<u32>,
    #[arg(long)]
    imgsz: Option<u32>,
    /// auto, cpu or cuda.
    #[arg(long)]
    device: Option<DevicePreference>,
    /// Root of the images/{train,val,test} tree.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Only write the dataset descriptor.
    #[arg(long)]
    skip_train: bool,
    /// Existing weights to validate/export when training is skipped.
    #[arg(long)]
    weights: Option<PathBuf>,
    /// Run validation after training.
    #[arg(long)]
    validate: bool,
    /// Export formats (repeatable), e.g. --export onnx --export torchscript.
    #[arg(long = "export")]
    export_formats: Vec<String>,
    /// Copy the ONNX export to the server's model path.
    #[arg(long)]
    install: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let args = Args::parse();
    let cfg = AppConfig::load();
    let tc = &cfg.training;

    info!("🪖 Military vehicle recognition - YOLOv8 training pipeline");

    let driver = TrainingDriver::new(Arc::new(YoloCli::new(tc.yolo_bin.clone())), Arc::new(NvidiaSmiProbe));

    // 1. Descriptor
    let data_dir = cfg.resolve(&args.data_dir.unwrap_or_else(|| tc.data_dir.clone()));
    let descriptor = cfg.resolve(&tc.descriptor);
    driver.write_descriptor(&data_dir, &descriptor)?;

    // 2. Training
    let weights = if args.skip_train {
        info!("⏭️  Training skipped");
        args.weights
    } else {
        let device = driver.resolve_device(args.device.unwrap_or(tc.device));
        let plan = TrainingPlan::new(
            &descriptor,
            args.size.unwrap_or(tc.model_size),
            args.epochs.unwrap_or(tc.epochs),
            args.imgsz.unwrap_or(tc.imgsz),
            device,
        );
        Some(timed("training", driver.train(&plan)).await?)
    };

    let Some(weights) = weights else {
        if args.validate || !args.export_formats.is_empty() || args.install {
            bail!("--weights is required to validate or export without training");
        }
        return Ok(());
    };

    // 3. Validation
    if args.validate {
        if let Err(e) = driver.validate(&weights, &descriptor).await {
            warn!("⚠️  Validation failed: {}", e);
        }
    }

    // 4. Export, one format at a time
    let mut formats = if args.export_formats.is_empty() && args.install {
        tc.export_formats.clone()
    } else {
        args.export_formats.clone()
    };
    if args.install && !formats.iter().any(|f| f == "onnx") {
        formats.push("onnx".into());
    }
    if formats.is_empty() {
        return Ok(());
    }
    let exports = driver.export(&weights, &formats).await;
    let failed = exports.values().filter(|r| r.is_err()).count();
    info!("📦 {} of {} exports succeeded", exports.len() - failed, exports.len());

    // 5. Hand the ONNX model to the detection server
    if args.install {
        let onnx = match exports.get("onnx") {
            Some(Ok(path)) => path.clone(),
            _ => bail!("ONNX export failed; nothing to install"),
        };
        let dest = cfg.resolve(&cfg.server.model_path);
        driver
            .install(&onnx, &dest)
            .with_context(|| format!("install {}", dest.display()))?;
    }

    Ok(())
}
