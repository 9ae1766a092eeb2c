use std::process::{Command, Stdio};
use tracing::debug;

use crate::application::ports::ComputeProbePort;
use crate::domain::training::Device;

/// Reports CUDA when `nvidia-smi -L` lists at least one GPU.
pub struct NvidiaSmiProbe;

impl ComputeProbePort for NvidiaSmiProbe {
    fn detect_device(&self) -> Device {
        let output = Command::new("nvidia-smi")
            .arg("-L")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        match output {
            Ok(out) if out.status.success() && lists_gpu(&String::from_utf8_lossy(&out.stdout)) => Device::Cuda,
            Ok(out) => {
                debug!("nvidia-smi reported no GPU ({})", out.status);
                Device::Cpu
            }
            Err(e) => {
                debug!("nvidia-smi unavailable: {}", e);
                Device::Cpu
            }
        }
    }
}

fn lists_gpu(stdout: &str) -> bool {
    stdout.lines().any(|l| l.trim_start().starts_with("GPU "))
}
