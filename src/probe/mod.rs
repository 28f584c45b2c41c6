//! Media probing module
//!
//! Combines the probe tool's duration with the filesystem's size into the
//! [`MediaMeta`] a run is planned from.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::MediaMeta;
use crate::ports::{FsPort, ProbePort};

/// Computes the media facts of a source once per run
pub struct DurationProbe {
    probe_port: Arc<dyn ProbePort>,
    fs_port: Arc<dyn FsPort>,
}

impl DurationProbe {
    pub fn new(probe_port: Arc<dyn ProbePort>, fs_port: Arc<dyn FsPort>) -> Self {
        Self { probe_port, fs_port }
    }

    /// Probe `source` for its duration and size
    pub async fn inspect(&self, source: &Path) -> Result<MediaMeta, DomainError> {
        if !self.fs_port.file_exists(source).await? {
            return Err(DomainError::ProbeFailure(format!(
                "Input file does not exist: {}",
                source.display()
            )));
        }

        let duration = self.probe_port.probe_duration(source).await?;
        let size_bytes = self.fs_port.get_file_size(source).await?;
        let meta = MediaMeta::from_probe(duration, size_bytes)?;

        info!(
            "Probed {}: {}s, {} bytes",
            source.display(),
            meta.duration_seconds,
            meta.size_bytes
        );
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;

    use super::*;

    struct FixedProbe(f64);

    #[async_trait]
    impl ProbePort for FixedProbe {
        async fn probe_duration(&self, _file_path: &Path) -> Result<f64, DomainError> {
            Ok(self.0)
        }
    }

    struct OneFile {
        path: PathBuf,
        size: u64,
    }

    #[async_trait]
    impl FsPort for OneFile {
        async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError> {
            Ok(file_path == self.path)
        }

        async fn get_file_size(&self, _file_path: &Path) -> Result<u64, DomainError> {
            Ok(self.size)
        }

        async fn delete_file(&self, _file_path: &Path) -> Result<(), DomainError> {
            Ok(())
        }

        async fn files_identical(&self, _left: &Path, _right: &Path) -> Result<bool, DomainError> {
            Ok(true)
        }
    }

    fn probe(duration: f64) -> DurationProbe {
        DurationProbe::new(
            Arc::new(FixedProbe(duration)),
            Arc::new(OneFile {
                path: PathBuf::from("movie.mp4"),
                size: 4_096,
            }),
        )
    }

    #[tokio::test]
    async fn test_inspect_truncates_duration() {
        let meta = probe(125.9).inspect(Path::new("movie.mp4")).await.unwrap();
        assert_eq!(meta.duration_seconds, 125);
        assert_eq!(meta.size_bytes, 4_096);
    }

    #[tokio::test]
    async fn test_missing_file_and_empty_media() {
        assert!(matches!(
            probe(10.0).inspect(Path::new("other.mp4")).await,
            Err(DomainError::ProbeFailure(_))
        ));
        assert!(matches!(
            probe(0.4).inspect(Path::new("movie.mp4")).await,
            Err(DomainError::ProbeFailure(_))
        ));
    }
}
