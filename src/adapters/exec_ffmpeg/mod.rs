//! FFmpeg execution adapter
//!
//! One `ffmpeg` process per extracted segment.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::ports::*;
use crate::utils::time::format_transcoder_seconds;

/// FFmpeg-based extraction adapter
pub struct FFmpegAdapter {
    binary: PathBuf,
}

impl FFmpegAdapter {
    /// Create an extraction adapter for the given `ffmpeg` binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    /// Argument vector for one extraction.
    ///
    /// Seeking happens after the input so that the cut is decoded, not
    /// snapped to the nearest keyframe of the demuxer.
    pub fn build_args(job: &ExtractionJob<'_>) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            job.source.display().to_string(),
            "-vcodec".to_string(),
            job.codecs.video_codec.clone(),
            "-acodec".to_string(),
            job.codecs.audio_codec.clone(),
        ];
        args.extend(job.codecs.extra_args.iter().cloned());
        args.extend([
            "-ss".to_string(),
            format_transcoder_seconds(job.start.seconds),
            "-t".to_string(),
            format_transcoder_seconds(job.length.seconds),
            job.destination.display().to_string(),
        ]);
        args
    }
}

impl Default for FFmpegAdapter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TranscodePort for FFmpegAdapter {
    async fn extract(&self, job: ExtractionJob<'_>) -> Result<(), DomainError> {
        let args = Self::build_args(&job);
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::ExtractionFailure(format!("Failed to run {}: {}", self.binary.display(), e))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DomainError::ExtractionFailure(format!(
                "ffmpeg exited with {} while writing {}: {}",
                output.status,
                job.destination.display(),
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            warn!("ffmpeg: {}", stderr.trim());
        }
        Ok(())
    }
}
