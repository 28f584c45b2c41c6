// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
///
/// Every variant aborts the run it is raised in; nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Split length is zero, negative or cannot be determined from the request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The source already fits into a single chunk
    #[error("Video is too short to split: {0}")]
    TooShort(String),

    /// Output names cannot be derived because the source file name has no extension
    #[error("No extension in file name: {0}")]
    NoExtension(String),

    /// Duration probe failed or returned an unusable value
    #[error("Failed to probe media file: {0}")]
    ProbeFailure(String),

    /// Transcoder failed to extract a segment
    #[error("Segment extraction failed: {0}")]
    ExtractionFailure(String),

    /// Encryption or decryption of a segment failed
    #[error("Archive operation failed: {0}")]
    ArchiveFailure(String),

    /// Filesystem operation failed
    #[error("File system error: {0}")]
    FsFail(String),

    /// Configuration file or environment value is invalid
    #[error("Bad configuration: {0}")]
    BadConfig(String),
}

impl DomainError {
    /// Errors caused by the shape of the request rather than by a collaborator.
    ///
    /// The CLI prints usage help for these.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidRequest(_) | DomainError::TooShort(_) | DomainError::NoExtension(_)
        )
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}
