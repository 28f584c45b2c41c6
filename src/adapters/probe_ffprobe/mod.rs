//! FFprobe adapter for media duration probing
//!
//! Runs the `ffprobe` binary and reads the container duration from its
//! plain-text output.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    binary: PathBuf,
}

impl FFprobeAdapter {
    /// Create a probe adapter for the given `ffprobe` binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    fn build_args(file_path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            file_path.display().to_string(),
        ]
    }

    /// Parse the duration printed by ffprobe
    pub fn parse_duration(stdout: &str) -> Result<f64, DomainError> {
        let value = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| DomainError::ProbeFailure("ffprobe printed no duration".to_string()))?;

        let duration = value
            .parse::<f64>()
            .map_err(|_| DomainError::ProbeFailure(format!("ffprobe printed an unusable duration: {}", value)))?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomainError::ProbeFailure(format!(
                "ffprobe printed an unusable duration: {}",
                value
            )));
        }
        Ok(duration)
    }
}

impl Default for FFprobeAdapter {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        let args = Self::build_args(file_path);
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::ProbeFailure(format!("Failed to run {}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::ProbeFailure(format!(
                "ffprobe exited with {} for {}: {}",
                output.status,
                file_path.display(),
                stderr.trim()
            )));
        }

        Self::parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}
