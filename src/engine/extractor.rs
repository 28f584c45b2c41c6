//! Segment extraction
//!
//! One transcoder call per planned chunk. Every call writes into a scratch
//! file next to the final output, which only takes its final name once the
//! transcoder succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::{ChunkPlan, CodecSettings, Segment, TimeSpec};
use crate::domain::rules::SegmentNaming;
use crate::engine::run_bounded;
use crate::ports::{ExtractionJob, TranscodePort};
use crate::utils::path::{persist_scratch, scratch_file_for};
use crate::utils::time::format_elapsed;

/// Extracts the planned chunks of a source into segment files
pub struct SegmentExtractor {
    transcode_port: Arc<dyn TranscodePort>,
    jobs: usize,
}

impl SegmentExtractor {
    pub fn new(transcode_port: Arc<dyn TranscodePort>, jobs: usize) -> Self {
        Self { transcode_port, jobs }
    }

    /// Segments a plan would produce, without touching the filesystem
    pub fn layout(source: &Path, plan: &ChunkPlan) -> Result<Vec<Segment>, DomainError> {
        let naming = SegmentNaming::for_source(source)?;
        let paths = naming.output_paths(plan.chunk_count())?;

        Ok(plan
            .bounds()
            .into_iter()
            .zip(paths)
            .map(|(bounds, output_path)| Segment {
                index: bounds.index,
                chunk_count: plan.chunk_count(),
                start_seconds: bounds.start.seconds,
                length_seconds: bounds.length.seconds,
                output_path,
            })
            .collect())
    }

    /// Extract every chunk of `plan`. The first failure aborts the rest.
    pub async fn extract(
        &self,
        source: &Path,
        plan: &ChunkPlan,
        codecs: &CodecSettings,
    ) -> Result<Vec<Segment>, DomainError> {
        let segments = Self::layout(source, plan)?;
        let extension = SegmentNaming::for_source(source)?.extension().to_string();
        info!(
            "Extracting {} segments from {}",
            segments.len(),
            source.display()
        );

        let source: PathBuf = source.to_path_buf();
        let codecs = codecs.clone();
        let transcode_port = Arc::clone(&self.transcode_port);

        run_bounded(
            self.jobs,
            segments,
            move |segment| {
                let transcode_port = Arc::clone(&transcode_port);
                let source = source.clone();
                let codecs = codecs.clone();
                let extension = extension.clone();
                async move {
                    Self::extract_one(transcode_port.as_ref(), &source, &codecs, &extension, segment).await
                }
            },
            DomainError::ExtractionFailure,
        )
        .await
    }

    async fn extract_one(
        transcode_port: &dyn TranscodePort,
        source: &Path,
        codecs: &CodecSettings,
        extension: &str,
        segment: Segment,
    ) -> Result<Segment, DomainError> {
        let started = Instant::now();
        let scratch = scratch_file_for(&segment.output_path, extension)?;
        let scratch_path = scratch.path().to_path_buf();

        transcode_port
            .extract(ExtractionJob {
                source,
                destination: &scratch_path,
                start: TimeSpec::from_seconds(segment.start_seconds),
                length: TimeSpec::from_seconds(segment.length_seconds),
                codecs,
            })
            .await?;
        persist_scratch(scratch, &segment.output_path)?;

        info!(
            "Extracted segment {}/{} -> {} in {}",
            segment.index,
            segment.chunk_count,
            segment.output_path.display(),
            format_elapsed(started.elapsed())
        );
        Ok(segment)
    }
}
