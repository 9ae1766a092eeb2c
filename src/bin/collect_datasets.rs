use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use vehicle_recognition::{
    adapters::tools::kaggle_cli::KaggleCli,
    application::services::DatasetCollector,
    config::AppConfig,
    telemetry,
};

#[derive(Parser, Debug)]
#[command(name = "collect-datasets", about = "Download and verify the vehicle datasets from Kaggle")]
struct Args {
    /// Project root holding kaggle.json and the data/ tree.
    #[arg(long)]
    project_root: Option<PathBuf>,
    /// Skip downloads and only verify what is already on disk.
    #[arg(long)]
    verify_only: bool,
    /// Print the collection report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();
    let args = Args::parse();
    let mut cfg = AppConfig::load();
    if let Some(root) = args.project_root {
        cfg.project_root = root;
    }

    info!("📡 Data collection for military vehicle recognition");

    let credentials = cfg.resolve(&cfg.collector.credentials_file);
    let config_dir = credentials
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.project_root.clone());
    let downloader = Arc::new(KaggleCli::new(cfg.collector.kaggle_bin.clone(), config_dir));
    let collector = DatasetCollector::new(
        downloader,
        cfg.resolve(&cfg.collector.data_dir),
        credentials,
        cfg.collector.datasets.clone(),
    );

    let report = match collector.collect_all(args.verify_only).await {
        Ok(report) => report,
        Err(e) => {
            error!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("❌ cannot serialize report: {}", e),
        }
    }

    if report.success() {
        ExitCode::SUCCESS
    } else {
        error!("✗ Some datasets failed to download or verify.");
        ExitCode::FAILURE
    }
}
