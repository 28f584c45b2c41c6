// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::domain::errors::DomainError;

/// Default safety margin applied to a byte-size target
pub const DEFAULT_FILESIZE_FACTOR: f64 = 0.95;

/// Suffix appended to a segment path to name its encrypted container
pub const ENCRYPTED_SUFFIX: &str = "aes";

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(DomainError::InvalidRequest(format!(
                    "Time must be a non-negative number of seconds: {}",
                    trimmed
                )));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let bad = |what: &str| DomainError::InvalidRequest(format!("Invalid {} in time '{}'", what, trimmed));
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = minutes.parse::<u32>().map_err(|_| bad("minutes"))?;
                let seconds = seconds.parse::<f64>().map_err(|_| bad("seconds"))?;
                if !(0.0..60.0).contains(&seconds) {
                    return Err(bad("seconds"));
                }
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours.parse::<u32>().map_err(|_| bad("hours"))?;
                let minutes = minutes.parse::<u32>().map_err(|_| bad("minutes"))?;
                let seconds = seconds.parse::<f64>().map_err(|_| bad("seconds"))?;
                if minutes >= 60 {
                    return Err(bad("minutes"));
                }
                if !(0.0..60.0).contains(&seconds) {
                    return Err(bad("seconds"));
                }
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(DomainError::InvalidRequest(format!(
                "Invalid time format '{}'. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                trimmed
            ))),
        }
    }

    /// Format as HH:MM:SS.ms
    pub fn format_hms(&self) -> String {
        let total_millis = (self.seconds * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// How a byte-size target is turned into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Derive the chunk duration from the average byte rate of the whole file
    #[default]
    Eager,
    /// Derive the chunk count from the byte target, then spread the duration evenly
    Even,
}

impl ChunkStrategy {
    /// Parse chunk strategy from string
    pub fn parse(strategy_str: &str) -> Result<Self, DomainError> {
        match strategy_str.trim().to_lowercase().as_str() {
            "eager" => Ok(ChunkStrategy::Eager),
            "even" => Ok(ChunkStrategy::Even),
            other => Err(DomainError::InvalidRequest(format!(
                "Invalid chunk strategy: {}. Valid strategies: eager, even",
                other
            ))),
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkStrategy::Eager => write!(f, "eager"),
            ChunkStrategy::Even => write!(f, "even"),
        }
    }
}

/// Codec selection and passthrough arguments handed to the transcoder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodecSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub extra_args: Vec<String>,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            video_codec: "copy".to_string(),
            audio_codec: "copy".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// One explicit `(start, length)` pair from a manifest
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentDescriptor {
    pub start: TimeSpec,
    pub length: TimeSpec,
}

impl SegmentDescriptor {
    /// Create a descriptor, rejecting empty lengths
    pub fn new(start: TimeSpec, length: TimeSpec) -> Result<Self, DomainError> {
        if length.seconds <= 0.0 {
            return Err(DomainError::InvalidRequest(format!(
                "Manifest segment starting at {} has a non-positive length",
                start
            )));
        }
        Ok(Self { start, length })
    }
}

/// The splitting criterion selected from a request, in resolution order
#[derive(Debug, Clone, PartialEq)]
pub enum SplitCriterion {
    /// Fixed chunk length in seconds
    Length(u64),
    /// Explicit boundaries, no arithmetic
    Manifest(Vec<SegmentDescriptor>),
    /// Approximate byte size per chunk
    TargetSize {
        target_bytes: u64,
        filesize_factor: f64,
        strategy: ChunkStrategy,
    },
    /// Fixed number of chunks
    ChunkCount(u64),
}

/// Immutable input of one split run
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRequest {
    pub source_path: PathBuf,
    pub split_length_seconds: Option<i64>,
    pub split_chunk_count: Option<u64>,
    pub split_target_bytes: Option<u64>,
    pub manifest: Option<Vec<SegmentDescriptor>>,
    pub filesize_factor: f64,
    pub chunk_strategy: ChunkStrategy,
    pub codecs: CodecSettings,
}

impl SplitRequest {
    /// Create a request for the given source with no criterion selected yet
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            split_length_seconds: None,
            split_chunk_count: None,
            split_target_bytes: None,
            manifest: None,
            filesize_factor: DEFAULT_FILESIZE_FACTOR,
            chunk_strategy: ChunkStrategy::default(),
            codecs: CodecSettings::default(),
        }
    }

    pub fn with_split_length(mut self, seconds: i64) -> Self {
        self.split_length_seconds = Some(seconds);
        self
    }

    pub fn with_chunk_count(mut self, count: u64) -> Self {
        self.split_chunk_count = Some(count);
        self
    }

    pub fn with_target_size(mut self, bytes: u64, filesize_factor: f64, strategy: ChunkStrategy) -> Self {
        self.split_target_bytes = Some(bytes);
        self.filesize_factor = filesize_factor;
        self.chunk_strategy = strategy;
        self
    }

    pub fn with_manifest(mut self, descriptors: Vec<SegmentDescriptor>) -> Self {
        self.manifest = Some(descriptors);
        self
    }

    pub fn with_codecs(mut self, codecs: CodecSettings) -> Self {
        self.codecs = codecs;
        self
    }

    /// Resolve which criterion is active.
    ///
    /// Order: explicit length, manifest, byte-size target, chunk count.
    /// Only cheap checks happen here so that a bad request fails before probing.
    pub fn criterion(&self) -> Result<SplitCriterion, DomainError> {
        if let Some(length) = self.split_length_seconds {
            if length <= 0 {
                return Err(DomainError::InvalidRequest(format!(
                    "Split length must be positive, got {}",
                    length
                )));
            }
            return Ok(SplitCriterion::Length(length as u64));
        }

        if let Some(descriptors) = &self.manifest {
            if descriptors.is_empty() {
                return Err(DomainError::InvalidRequest(
                    "Manifest does not describe any segment".to_string(),
                ));
            }
            return Ok(SplitCriterion::Manifest(descriptors.clone()));
        }

        if let Some(target_bytes) = self.split_target_bytes {
            if target_bytes == 0 {
                return Err(DomainError::InvalidRequest(
                    "Target chunk size must be positive".to_string(),
                ));
            }
            if !(self.filesize_factor > 0.0 && self.filesize_factor <= 1.0) {
                return Err(DomainError::InvalidRequest(format!(
                    "Filesize factor must be in (0, 1], got {}",
                    self.filesize_factor
                )));
            }
            return Ok(SplitCriterion::TargetSize {
                target_bytes,
                filesize_factor: self.filesize_factor,
                strategy: self.chunk_strategy,
            });
        }

        if let Some(count) = self.split_chunk_count {
            if count == 0 {
                return Err(DomainError::InvalidRequest(
                    "Chunk count must be positive".to_string(),
                ));
            }
            return Ok(SplitCriterion::ChunkCount(count));
        }

        Err(DomainError::InvalidRequest(
            "No split criterion given: expected a split length, chunk count, target size or manifest"
                .to_string(),
        ))
    }
}

/// Facts about the source, computed once per run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MediaMeta {
    /// Whole seconds, the unit every uniform plan is computed in
    pub duration_seconds: u64,
    /// Duration exactly as probed
    pub probed_seconds: f64,
    pub size_bytes: u64,
}

impl MediaMeta {
    /// Build from a raw probe result, truncating the duration to whole seconds
    pub fn from_probe(duration_seconds: f64, size_bytes: u64) -> Result<Self, DomainError> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(DomainError::ProbeFailure(format!(
                "Probe reported an invalid duration: {}",
                duration_seconds
            )));
        }
        let truncated = duration_seconds.trunc() as u64;
        if truncated == 0 {
            return Err(DomainError::ProbeFailure(format!(
                "Media is shorter than one second ({:.3}s)",
                duration_seconds
            )));
        }
        Ok(Self {
            duration_seconds: truncated,
            probed_seconds: duration_seconds,
            size_bytes,
        })
    }
}

/// Which path of the planner produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    SplitLength,
    Manifest,
    EvenSize,
    EagerSize,
    ChunkCount,
}

/// Chunk boundaries of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkLayout {
    /// Every chunk has the same requested length
    Uniform { chunk_length_seconds: u64 },
    /// Boundaries taken verbatim from a manifest
    Explicit { descriptors: Vec<SegmentDescriptor> },
}

/// Start and length of one planned chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBounds {
    pub index: u64,
    pub start: TimeSpec,
    pub length: TimeSpec,
}

/// Computed plan, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkPlan {
    chunk_count: u64,
    layout: ChunkLayout,
    source: PlanSource,
}

impl ChunkPlan {
    /// Uniform plan; the last chunk may run past end-of-stream
    pub fn uniform(chunk_count: u64, chunk_length_seconds: u64, source: PlanSource) -> Result<Self, DomainError> {
        if chunk_length_seconds == 0 {
            return Err(DomainError::InvalidRequest(
                "Effective split length is zero".to_string(),
            ));
        }
        Self::check_count(chunk_count)?;
        Ok(Self {
            chunk_count,
            layout: ChunkLayout::Uniform { chunk_length_seconds },
            source,
        })
    }

    /// Explicit plan from manifest descriptors
    pub fn explicit(descriptors: Vec<SegmentDescriptor>) -> Result<Self, DomainError> {
        Self::check_count(descriptors.len() as u64)?;
        Ok(Self {
            chunk_count: descriptors.len() as u64,
            layout: ChunkLayout::Explicit { descriptors },
            source: PlanSource::Manifest,
        })
    }

    fn check_count(chunk_count: u64) -> Result<(), DomainError> {
        match chunk_count {
            0 => Err(DomainError::InvalidRequest(
                "Plan does not contain any chunk".to_string(),
            )),
            1 => Err(DomainError::TooShort(
                "Video length is less than the target split length".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn source(&self) -> PlanSource {
        self.source
    }

    /// Uniform chunk length, if the plan has one
    pub fn chunk_length_seconds(&self) -> Option<u64> {
        match &self.layout {
            ChunkLayout::Uniform { chunk_length_seconds } => Some(*chunk_length_seconds),
            ChunkLayout::Explicit { .. } => None,
        }
    }

    /// Bounds of every chunk in index order (1-based)
    pub fn bounds(&self) -> Vec<ChunkBounds> {
        match &self.layout {
            ChunkLayout::Uniform { chunk_length_seconds } => (0..self.chunk_count)
                .map(|n| ChunkBounds {
                    index: n + 1,
                    start: TimeSpec::from_seconds((n * chunk_length_seconds) as f64),
                    length: TimeSpec::from_seconds(*chunk_length_seconds as f64),
                })
                .collect(),
            ChunkLayout::Explicit { descriptors } => descriptors
                .iter()
                .enumerate()
                .map(|(n, descriptor)| ChunkBounds {
                    index: n as u64 + 1,
                    start: descriptor.start,
                    length: descriptor.length,
                })
                .collect(),
        }
    }
}

/// One extracted chunk of the source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub index: u64,
    pub chunk_count: u64,
    pub start_seconds: f64,
    pub length_seconds: f64,
    pub output_path: PathBuf,
}

/// Encrypted copy of a segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncryptedSegment {
    pub index: u64,
    pub plaintext_path: PathBuf,
    pub encrypted_path: PathBuf,
    pub elapsed_ms: u64,
}

impl EncryptedSegment {
    /// Container path for a plaintext segment path
    pub fn container_path_for(plaintext: &Path) -> PathBuf {
        let mut name = plaintext.as_os_str().to_os_string();
        name.push(".");
        name.push(ENCRYPTED_SUFFIX);
        PathBuf::from(name)
    }
}

/// Opaque password, wiped on drop and never printed
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(secret: impl Into<String>) -> Result<Self, DomainError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(DomainError::BadConfig("Password cannot be empty".to_string()));
        }
        Ok(Self(Zeroizing::new(secret)))
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

#[cfg(test)]
mod tests;
