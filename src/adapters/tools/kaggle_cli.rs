use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::DatasetDownloaderPort;
use crate::domain::dataset::DatasetSpec;
use crate::domain::errors::{DomainError, DomainResult};

/// Runs `kaggle datasets download -d <name> -p <dest> --unzip`.
pub struct KaggleCli {
    program: PathBuf,
    config_dir: PathBuf,
}

impl KaggleCli {
    /// `config_dir` is the directory holding `kaggle.json`.
    pub fn new(program: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), config_dir: config_dir.into() }
    }

    pub fn args(dataset: &DatasetSpec, dest: &Path) -> Vec<String> {
        vec![
            "datasets".into(),
            "download".into(),
            "-d".into(),
            dataset.name.clone(),
            "-p".into(),
            dest.display().to_string(),
            "--unzip".into(),
        ]
    }
}

#[async_trait]
impl DatasetDownloaderPort for KaggleCli {
    async fn download(&self, dataset: &DatasetSpec, dest: &Path) -> DomainResult<()> {
        let args = Self::args(dataset, dest);
        debug!("running {} {}", self.program.display(), args.join(" "));

        let status = Command::new(&self.program)
            .args(&args)
            .env("KAGGLE_CONFIG_DIR", &self.config_dir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                DomainError::OperationFailed(format!("failed to start {}: {}", self.program.display(), e))
            })?;

        if !status.success() {
            return Err(DomainError::OperationFailed(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}
