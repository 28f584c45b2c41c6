//! Chunk planning implementation

use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::{
    ChunkPlan, ChunkStrategy, MediaMeta, PlanSource, SegmentDescriptor, SplitCriterion, SplitRequest,
};
use crate::domain::rules::ceildiv;

/// Turns a split request and the media facts into a chunk plan
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkPlanner;

impl ChunkPlanner {
    /// Create a new chunk planner
    pub fn new() -> Self {
        Self
    }

    /// Plan the chunks of a source.
    ///
    /// Fails with `InvalidRequest` when no positive chunk length can be
    /// determined and with `TooShort` when everything fits into one chunk.
    pub fn plan(&self, meta: &MediaMeta, request: &SplitRequest) -> Result<ChunkPlan, DomainError> {
        let criterion = request.criterion()?;
        debug!("Planning {:?} for {:?}", criterion, meta);

        let plan = match criterion {
            SplitCriterion::Length(split_length) => {
                Self::from_length(meta.duration_seconds, split_length, PlanSource::SplitLength)?
            }
            SplitCriterion::Manifest(descriptors) => Self::from_manifest(meta, descriptors)?,
            SplitCriterion::TargetSize {
                target_bytes,
                filesize_factor,
                strategy,
            } => {
                let effective_target = Self::effective_target(target_bytes, filesize_factor)?;
                if meta.size_bytes == 0 {
                    return Err(DomainError::InvalidRequest(
                        "Cannot plan by size for an empty file".to_string(),
                    ));
                }
                match strategy {
                    ChunkStrategy::Even => {
                        let chunk_count = ceildiv(meta.size_bytes, effective_target)?;
                        Self::from_count(meta.duration_seconds, chunk_count, PlanSource::EvenSize)?
                    }
                    ChunkStrategy::Eager => {
                        let split_length =
                            Self::eager_length(meta.duration_seconds, meta.size_bytes, effective_target);
                        Self::from_length(meta.duration_seconds, split_length, PlanSource::EagerSize)?
                    }
                }
            }
            SplitCriterion::ChunkCount(chunk_count) => {
                Self::from_count(meta.duration_seconds, chunk_count, PlanSource::ChunkCount)?
            }
        };

        match plan.chunk_length_seconds() {
            Some(length) => info!(
                "Planned {} chunks of {}s ({:?})",
                plan.chunk_count(),
                length,
                plan.source()
            ),
            None => info!("Planned {} chunks from manifest", plan.chunk_count()),
        }
        Ok(plan)
    }

    /// Shrink a byte target by the overshoot safety factor
    pub fn effective_target(target_bytes: u64, filesize_factor: f64) -> Result<u64, DomainError> {
        let effective = (target_bytes as f64 * filesize_factor).floor() as u64;
        if effective == 0 {
            return Err(DomainError::InvalidRequest(format!(
                "Target size {} shrinks to zero bytes with factor {}",
                target_bytes, filesize_factor
            )));
        }
        Ok(effective)
    }

    /// Chunk length from the average byte rate of the whole file.
    ///
    /// Assumes a uniform bitrate, so the resulting chunk sizes are approximate.
    pub fn eager_length(duration_seconds: u64, size_bytes: u64, effective_target: u64) -> u64 {
        (effective_target as f64 / size_bytes as f64 * duration_seconds as f64).floor() as u64
    }

    fn from_length(duration_seconds: u64, split_length: u64, source: PlanSource) -> Result<ChunkPlan, DomainError> {
        if split_length == 0 {
            return Err(DomainError::InvalidRequest(
                "Target size is too small to cover one second of video".to_string(),
            ));
        }
        let chunk_count = ceildiv(duration_seconds, split_length)?;
        ChunkPlan::uniform(chunk_count, split_length, source)
    }

    /// Uniform length for a requested count. The count is then recomputed from
    /// that length, so no chunk starts at or past the end of the media.
    fn from_count(duration_seconds: u64, requested_count: u64, source: PlanSource) -> Result<ChunkPlan, DomainError> {
        let split_length = ceildiv(duration_seconds, requested_count)?;
        if split_length == 0 {
            return Err(DomainError::InvalidRequest(
                "Media has no duration to split".to_string(),
            ));
        }
        let chunk_count = ceildiv(duration_seconds, split_length)?;
        if chunk_count != requested_count {
            debug!(
                "Requested {} chunks, {} are needed at {}s each",
                requested_count, chunk_count, split_length
            );
        }
        ChunkPlan::uniform(chunk_count, split_length, source)
    }

    fn from_manifest(meta: &MediaMeta, descriptors: Vec<SegmentDescriptor>) -> Result<ChunkPlan, DomainError> {
        for (n, descriptor) in descriptors.iter().enumerate() {
            if descriptor.start.seconds >= meta.probed_seconds {
                return Err(DomainError::InvalidRequest(format!(
                    "Manifest segment {} starts at {} which is past the end of the media ({:.3}s)",
                    n + 1,
                    descriptor.start,
                    meta.probed_seconds
                )));
            }
        }
        ChunkPlan::explicit(descriptors)
    }
}
