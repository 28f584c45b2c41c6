//! Run reports
//!
//! JSON documents describing what a run planned and produced.

use std::fmt::Write as _;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::{ChunkPlan, EncryptedSegment, MediaMeta, Segment, TimeSpec};
use crate::utils::format_file_size;
use crate::utils::path::{persist_scratch, scratch_file_for};

/// Planned segment as shown by `plan`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSegment {
    pub index: u64,
    pub start_seconds: f64,
    pub length_seconds: f64,
    pub output_path: PathBuf,
}

impl From<&Segment> for PlannedSegment {
    fn from(segment: &Segment) -> Self {
        Self {
            index: segment.index,
            start_seconds: segment.start_seconds,
            length_seconds: segment.length_seconds,
            output_path: segment.output_path.clone(),
        }
    }
}

/// Outcome of a dry run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub source: PathBuf,
    pub media: MediaMeta,
    pub plan: ChunkPlan,
    pub segments: Vec<PlannedSegment>,
}

impl PlanSummary {
    pub fn new(source: &Path, media: MediaMeta, plan: ChunkPlan, segments: &[Segment]) -> Self {
        Self {
            source: source.to_path_buf(),
            media,
            plan,
            segments: segments.iter().map(PlannedSegment::from).collect(),
        }
    }

    /// Human readable table
    pub fn to_table(&self) -> String {
        let mut table = String::new();
        let _ = writeln!(
            table,
            "{}: {}s, {} -> {} segments ({:?})",
            self.source.display(),
            self.media.duration_seconds,
            format_file_size(self.media.size_bytes),
            self.plan.chunk_count(),
            self.plan.source()
        );
        let _ = writeln!(table, "{:>5}  {:>12}  {:>12}  output", "#", "start", "length");
        for segment in &self.segments {
            let _ = writeln!(
                table,
                "{:>5}  {:>12}  {:>12}  {}",
                segment.index,
                TimeSpec::from_seconds(segment.start_seconds).format_hms(),
                TimeSpec::from_seconds(segment.length_seconds).format_hms(),
                segment.output_path.display()
            );
        }
        table
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::FsFail(format!("Failed to serialize plan: {}", e)))
    }
}

/// One archived segment in a run report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchivedSegment {
    pub index: u64,
    pub start_seconds: f64,
    pub length_seconds: f64,
    pub plaintext_path: PathBuf,
    pub encrypted_path: PathBuf,
    pub encrypt_ms: u64,
}

/// Full record of a split run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub source: PathBuf,
    pub media: MediaMeta,
    pub plan: ChunkPlan,
    pub segments: Vec<ArchivedSegment>,
    pub verified: bool,
    pub plaintext_removed: bool,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Pair segments with their containers by index
    pub fn new(
        source: &Path,
        media: MediaMeta,
        plan: ChunkPlan,
        segments: &[Segment],
        encrypted: &[EncryptedSegment],
    ) -> Self {
        let segments = segments
            .iter()
            .zip(encrypted)
            .map(|(segment, sealed)| ArchivedSegment {
                index: segment.index,
                start_seconds: segment.start_seconds,
                length_seconds: segment.length_seconds,
                plaintext_path: sealed.plaintext_path.clone(),
                encrypted_path: sealed.encrypted_path.clone(),
                encrypt_ms: sealed.elapsed_ms,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            source: source.to_path_buf(),
            media,
            plan,
            segments,
            verified: false,
            plaintext_removed: false,
            elapsed_ms: 0,
        }
    }

    /// Write the report as pretty JSON, replacing `path` atomically
    pub fn write_to(&self, path: &Path) -> Result<(), DomainError> {
        let scratch = scratch_file_for(path, "json")?;
        {
            let mut writer = BufWriter::new(scratch.as_file());
            serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| DomainError::FsFail(format!("Failed to serialize report: {}", e)))?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        persist_scratch(scratch, path)?;
        info!("Wrote run report to {}", path.display());
        Ok(())
    }
}
