use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::application::ports::TrainerPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::training::{export_path_for, TrainingPlan, ValidationMetrics};

/// Drives the Ultralytics `yolo` command line.
pub struct YoloCli {
    program: PathBuf,
}

impl YoloCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Runs with inherited stdout/stderr so training progress stays visible.
    async fn run_inherited(&self, args: &[String]) -> DomainResult<()> {
        debug!("running {} {}", self.program.display(), args.join(" "));
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;
        if !status.success() {
            return Err(DomainError::OperationFailed(format!("{} exited with {}", args[..2].join(" "), status)));
        }
        Ok(())
    }

    /// Runs and returns stdout and stderr concatenated.
    async fn run_captured(&self, args: &[String]) -> DomainResult<String> {
        debug!("running {} {}", self.program.display(), args.join(" "));
        let out = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));
        if !out.status.success() {
            let tail: Vec<&str> = text.lines().rev().take(5).collect();
            return Err(DomainError::OperationFailed(format!(
                "{} exited with {}: {}",
                args[..2].join(" "),
                out.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }
        Ok(text)
    }

    fn spawn_error(&self, e: std::io::Error) -> DomainError {
        DomainError::OperationFailed(format!("failed to start {}: {}", self.program.display(), e))
    }
}

#[async_trait]
impl TrainerPort for YoloCli {
    async fn train(&self, plan: &TrainingPlan) -> DomainResult<PathBuf> {
        let mut args = vec!["detect".to_string(), "train".to_string()];
        args.extend(plan.to_args());
        self.run_inherited(&args).await?;

        let best = plan.best_weights();
        if !best.exists() {
            warn!("⚠️  trainer finished but {} does not exist", best.display());
        }
        Ok(best)
    }

    async fn validate(&self, weights: &Path, descriptor: &Path) -> DomainResult<ValidationMetrics> {
        let args = vec![
            "detect".to_string(),
            "val".to_string(),
            format!("model={}", weights.display()),
            format!("data={}", descriptor.display()),
        ];
        let output = self.run_captured(&args).await?;
        parse_val_summary(&output).ok_or_else(|| {
            DomainError::OperationFailed("validation output has no 'all' summary row".into())
        })
    }

    async fn export(&self, weights: &Path, format: &str) -> DomainResult<PathBuf> {
        let args = vec![
            "export".to_string(),
            format!("model={}", weights.display()),
            format!("format={}", format),
        ];
        let output = self.run_captured(&args).await?;
        Ok(parse_export_path(&output).unwrap_or_else(|| export_path_for(weights, format)))
    }
}

/// Reads mAP50 and mAP50-95 from the `all` row of the validation table
/// (`all <images> <instances> <P> <R> <mAP50> <mAP50-95>`).
pub fn parse_val_summary(output: &str) -> Option<ValidationMetrics> {
    output.lines().rev().find_map(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != "all" {
            return None;
        }
        let numbers: Vec<f64> = tokens.filter_map(|t| t.parse().ok()).collect();
        if numbers.len() < 6 {
            return None;
        }
        Some(ValidationMetrics {
            map50: numbers[numbers.len() - 2],
            map50_95: numbers[numbers.len() - 1],
        })
    })
}

/// Picks the last `saved as '<path>'` fragment of the export log.
pub fn parse_export_path(output: &str) -> Option<PathBuf> {
    const MARKER: &str = "saved as '";
    let start = output.rfind(MARKER)? + MARKER.len();
    let rest = &output[start..];
    let end = rest.find('\'')?;
    Some(PathBuf::from(&rest[..end]))
}
