// Split interactor - Orchestrates probe, plan, extract and archive

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::SegmentNaming;
use crate::engine::{SecureArchiver, SegmentExtractor};
use crate::output::{PlanSummary, RunReport};
use crate::planner::ChunkPlanner;
use crate::ports::*;
use crate::probe::DurationProbe;
use crate::utils::time::{as_millis_u64, format_elapsed};

/// Post-processing switches of a split run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitOptions {
    /// Decrypt every container again and compare with its segment
    pub verify: bool,
    /// Delete plaintext segments after they are archived
    pub remove_plaintext: bool,
    /// Where to write the JSON run report
    pub report_path: Option<PathBuf>,
}

/// Outcome of a split run
#[derive(Debug, Clone)]
pub struct SplitResponse {
    pub segments: Vec<Segment>,
    pub encrypted: Vec<EncryptedSegment>,
    pub report: RunReport,
}

/// Interactor for the split use case
pub struct SplitInteractor {
    probe: DurationProbe,
    planner: ChunkPlanner,
    extractor: SegmentExtractor,
    archiver: SecureArchiver,
}

impl SplitInteractor {
    /// Create new split interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        transcode_port: Arc<dyn TranscodePort>,
        cipher_port: Arc<dyn CipherPort>,
        fs_port: Arc<dyn FsPort>,
        buffer_size: usize,
        jobs: usize,
    ) -> Self {
        Self {
            probe: DurationProbe::new(probe_port, Arc::clone(&fs_port)),
            planner: ChunkPlanner::new(),
            extractor: SegmentExtractor::new(transcode_port, jobs),
            archiver: SecureArchiver::new(cipher_port, fs_port, buffer_size, jobs),
        }
    }

    /// Validate, probe and plan. Cheap checks run before the probe.
    async fn prepare(&self, request: &SplitRequest) -> Result<(MediaMeta, ChunkPlan), DomainError> {
        request.criterion()?;
        SegmentNaming::for_source(&request.source_path)?;

        let media = self.probe.inspect(&request.source_path).await?;
        let plan = self.planner.plan(&media, request)?;
        Ok((media, plan))
    }

    /// Probe and plan without side effects
    pub async fn plan(&self, request: &SplitRequest) -> Result<PlanSummary, DomainError> {
        let (media, plan) = self.prepare(request).await?;
        let segments = SegmentExtractor::layout(&request.source_path, &plan)?;
        Ok(PlanSummary::new(&request.source_path, media, plan, &segments))
    }

    /// Run the whole pipeline: probe, plan, extract, encrypt, then optionally verify
    pub async fn execute(
        &self,
        request: &SplitRequest,
        password: &Password,
        options: &SplitOptions,
    ) -> Result<SplitResponse, DomainError> {
        let started = Instant::now();
        info!("Starting split of {}", request.source_path.display());

        let (media, plan) = self.prepare(request).await?;
        let segments = self
            .extractor
            .extract(&request.source_path, &plan, &request.codecs)
            .await?;
        let encrypted = self.archiver.secure(&segments, password).await?;

        if options.verify {
            self.archiver.verify(&encrypted, password).await?;
        }
        if options.remove_plaintext {
            self.archiver.remove_plaintext(&encrypted).await?;
        }

        let mut report = RunReport::new(&request.source_path, media, plan, &segments, &encrypted);
        report.verified = options.verify;
        report.plaintext_removed = options.remove_plaintext;
        report.elapsed_ms = as_millis_u64(started.elapsed());
        if let Some(path) = &options.report_path {
            report.write_to(path)?;
        }

        info!(
            "Split {} into {} encrypted segments in {}",
            request.source_path.display(),
            encrypted.len(),
            format_elapsed(started.elapsed())
        );
        Ok(SplitResponse {
            segments,
            encrypted,
            report,
        })
    }
}
