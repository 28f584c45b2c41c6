// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media duration probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Total duration of the media file in seconds, as reported by the probe tool
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError>;
}

/// One transcoder invocation: extract `[start, start + length)` of `source` into `destination`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionJob<'a> {
    pub source: &'a Path,
    pub destination: &'a Path,
    pub start: TimeSpec,
    pub length: TimeSpec,
    pub codecs: &'a CodecSettings,
}

/// Port for segment extraction
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Produce the destination file or fail with `ExtractionFailure`
    async fn extract(&self, job: ExtractionJob<'_>) -> Result<(), DomainError>;
}

/// Port for the symmetric encryption routine
#[async_trait]
pub trait CipherPort: Send + Sync {
    /// Encrypt `source` into the container `destination`
    async fn encrypt_file(
        &self,
        source: &Path,
        destination: &Path,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError>;

    /// Decrypt the container `source` into `destination`.
    ///
    /// Must fail on a wrong password or a damaged container, never write altered bytes.
    async fn decrypt_file(
        &self,
        source: &Path,
        destination: &Path,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if file exists
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError>;

    /// Get file size
    async fn get_file_size(&self, file_path: &Path) -> Result<u64, DomainError>;

    /// Delete file
    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError>;

    /// Compare two files byte for byte
    async fn files_identical(&self, left: &Path, right: &Path) -> Result<bool, DomainError>;
}
