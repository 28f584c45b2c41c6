use std::path::{Path, PathBuf};
use std::sync::Arc;

use splitvault::adapters::{AesGcmCipher, FsLocalAdapter, KdfParams};
use splitvault::app::{AppContainer, DefaultAppContainer, SplitOptions};
use splitvault::config_initialization::AppConfig;
use splitvault::domain::model::*;
use splitvault::DomainError;
use tempfile::TempDir;

/// Fake collaborators so the pipeline runs without ffmpeg
mod test_utils {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use splitvault::domain::model::Password;
    use splitvault::ports::*;
    use splitvault::DomainError;

    /// Reports a fixed duration and counts calls
    pub struct FakeProbe {
        pub duration: f64,
        pub calls: AtomicUsize,
    }

    impl FakeProbe {
        pub fn new(duration: f64) -> Self {
            Self {
                duration,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProbePort for FakeProbe {
        async fn probe_duration(&self, _file_path: &Path) -> Result<f64, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.duration)
        }
    }

    /// Writes a recognisable body per chunk, optionally failing at one start offset
    pub struct FakeTranscoder {
        pub fail_at_start: Option<f64>,
        pub calls: Mutex<Vec<(f64, f64, Vec<String>)>>,
    }

    impl FakeTranscoder {
        pub fn new() -> Self {
            Self {
                fail_at_start: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_at(start: f64) -> Self {
            Self {
                fail_at_start: Some(start),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn body(start: f64, length: f64) -> Vec<u8> {
            format!("chunk {}+{};", start, length).repeat(500).into_bytes()
        }

        pub fn calls(&self) -> Vec<(f64, f64, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscodePort for FakeTranscoder {
        async fn extract(&self, job: ExtractionJob<'_>) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push((
                job.start.seconds,
                job.length.seconds,
                job.codecs.extra_args.clone(),
            ));
            if self.fail_at_start == Some(job.start.seconds) {
                return Err(DomainError::ExtractionFailure(format!(
                    "cannot cut at {}",
                    job.start.seconds
                )));
            }
            std::fs::write(job.destination, Self::body(job.start.seconds, job.length.seconds))?;
            Ok(())
        }
    }

    /// Encrypts with the real cipher but fails for one file name
    pub struct FlakyCipher<C: CipherPort> {
        pub inner: C,
        pub fail_for: String,
    }

    #[async_trait]
    impl<C: CipherPort> CipherPort for FlakyCipher<C> {
        async fn encrypt_file(
            &self,
            source: &Path,
            destination: &Path,
            password: &Password,
            buffer_size: usize,
        ) -> Result<(), DomainError> {
            if source.to_string_lossy().ends_with(&self.fail_for) {
                return Err(DomainError::ArchiveFailure("disk full".to_string()));
            }
            self.inner.encrypt_file(source, destination, password, buffer_size).await
        }

        async fn decrypt_file(
            &self,
            source: &Path,
            destination: &Path,
            password: &Password,
            buffer_size: usize,
        ) -> Result<(), DomainError> {
            self.inner.decrypt_file(source, destination, password, buffer_size).await
        }
    }

    /// Every file name in `dir`, sorted
    pub fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn source_in(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; 10_000]).unwrap();
        path
    }
}

use test_utils::*;

fn fast_cipher() -> AesGcmCipher {
    AesGcmCipher::with_kdf(KdfParams {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
}

fn config(jobs: usize) -> AppConfig {
    AppConfig {
        buffer_size: 4096,
        jobs,
        ..Default::default()
    }
}

fn container_with(
    probe: Arc<FakeProbe>,
    transcoder: Arc<FakeTranscoder>,
    jobs: usize,
) -> DefaultAppContainer {
    DefaultAppContainer::with_ports(
        probe,
        transcoder,
        Arc::new(fast_cipher()),
        Arc::new(FsLocalAdapter::new()),
        &config(jobs),
    )
}

fn password() -> Password {
    Password::new("correct horse battery staple").unwrap()
}

#[tokio::test]
async fn test_split_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "movie.mp4");
    let probe = Arc::new(FakeProbe::new(125.4));
    let transcoder = Arc::new(FakeTranscoder::new());
    let container = container_with(Arc::clone(&probe), Arc::clone(&transcoder), 1);

    let request = SplitRequest::new(&source)
        .with_split_length(30)
        .with_codecs(CodecSettings {
            extra_args: vec!["-threads".to_string(), "2".to_string()],
            ..Default::default()
        });
    let report_path = dir.path().join("report.json");
    let options = SplitOptions {
        verify: true,
        remove_plaintext: false,
        report_path: Some(report_path.clone()),
    };

    let response = container
        .split_interactor()
        .execute(&request, &password(), &options)
        .await
        .unwrap();

    assert_eq!(probe.calls(), 1);
    let starts: Vec<f64> = transcoder.calls().iter().map(|call| call.0).collect();
    assert_eq!(starts, vec![0.0, 30.0, 60.0, 90.0, 120.0]);
    assert!(transcoder.calls().iter().all(|call| call.1 == 30.0 && call.2 == ["-threads", "2"]));

    assert_eq!(response.segments.len(), 5);
    assert_eq!(response.encrypted.len(), 5);
    for (n, sealed) in response.encrypted.iter().enumerate() {
        let index = n as u64 + 1;
        assert_eq!(sealed.index, index);
        assert_eq!(
            sealed.encrypted_path,
            dir.path().join(format!("movie-{}-of-5.mp4.aes", index))
        );
        assert!(sealed.encrypted_path.is_file());
        assert!(sealed.plaintext_path.is_file());
    }

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["media"]["duration_seconds"], 125);
    assert_eq!(report["plan"]["chunk_count"], 5);
    assert_eq!(report["verified"], true);
    assert_eq!(report["segments"].as_array().unwrap().len(), 5);

    // Only source, segments, containers and the report are left behind
    assert_eq!(file_names(dir.path()).len(), 1 + 5 + 5 + 1);
}

#[tokio::test]
async fn test_encrypted_segments_restore_after_plaintext_removal() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "talk.mkv");
    let container = container_with(
        Arc::new(FakeProbe::new(40.0)),
        Arc::new(FakeTranscoder::new()),
        2,
    );

    let request = SplitRequest::new(&source).with_chunk_count(2);
    let options = SplitOptions {
        remove_plaintext: true,
        ..Default::default()
    };
    let response = container
        .split_interactor()
        .execute(&request, &password(), &options)
        .await
        .unwrap();
    assert!(response.segments.iter().all(|segment| !segment.output_path.exists()));

    let restored = container
        .decrypt_interactor()
        .execute(dir.path(), &password(), false)
        .await
        .unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(
        std::fs::read(dir.path().join("talk-2-of-2.mkv")).unwrap(),
        FakeTranscoder::body(20.0, 20.0)
    );

    // Restoring again refuses to overwrite unless forced
    let again = container
        .decrypt_interactor()
        .execute(dir.path(), &password(), false)
        .await;
    assert!(matches!(again, Err(DomainError::FsFail(_))));
    container
        .decrypt_interactor()
        .execute(dir.path(), &password(), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_wrong_password_does_not_restore() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "clip.mp4");
    let container = container_with(
        Arc::new(FakeProbe::new(20.0)),
        Arc::new(FakeTranscoder::new()),
        1,
    );
    let request = SplitRequest::new(&source).with_split_length(10);
    let options = SplitOptions {
        remove_plaintext: true,
        ..Default::default()
    };
    container
        .split_interactor()
        .execute(&request, &password(), &options)
        .await
        .unwrap();

    let wrong = Password::new("guess").unwrap();
    let result = container.decrypt_interactor().execute(dir.path(), &wrong, false).await;
    assert!(matches!(result, Err(DomainError::ArchiveFailure(_))));
    assert!(!dir.path().join("clip-1-of-2.mp4").exists());
}

#[tokio::test]
async fn test_bad_requests_fail_before_probing() {
    let dir = TempDir::new().unwrap();
    let probe = Arc::new(FakeProbe::new(100.0));
    let container = container_with(Arc::clone(&probe), Arc::new(FakeTranscoder::new()), 1);
    let interactor = container.split_interactor();

    let zero_length = SplitRequest::new(dir.path().join("missing.mp4")).with_split_length(0);
    assert!(matches!(
        interactor.plan(&zero_length).await,
        Err(DomainError::InvalidRequest(_))
    ));

    let negative = SplitRequest::new(dir.path().join("missing.mp4")).with_split_length(-10);
    assert!(matches!(
        interactor.execute(&negative, &password(), &SplitOptions::default()).await,
        Err(DomainError::InvalidRequest(_))
    ));

    let no_extension = SplitRequest::new(source_in(dir.path(), "movie")).with_split_length(30);
    assert!(matches!(
        interactor.plan(&no_extension).await,
        Err(DomainError::NoExtension(_))
    ));

    let no_criterion = SplitRequest::new(source_in(dir.path(), "movie.mp4"));
    assert!(matches!(
        interactor.plan(&no_criterion).await,
        Err(DomainError::InvalidRequest(_))
    ));

    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_too_short_has_no_side_effects() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "short.mp4");
    let transcoder = Arc::new(FakeTranscoder::new());
    let container = container_with(Arc::new(FakeProbe::new(20.0)), Arc::clone(&transcoder), 1);

    let request = SplitRequest::new(&source).with_split_length(30);
    let result = container
        .split_interactor()
        .execute(&request, &password(), &SplitOptions::default())
        .await;

    assert!(matches!(result, Err(DomainError::TooShort(_))));
    assert!(transcoder.calls().is_empty());
    assert_eq!(file_names(dir.path()), vec!["short.mp4"]);
}

#[tokio::test]
async fn test_extraction_failure_aborts_remaining_chunks() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "movie.mp4");
    let transcoder = Arc::new(FakeTranscoder::failing_at(20.0));
    let container = container_with(Arc::new(FakeProbe::new(50.0)), Arc::clone(&transcoder), 1);

    let request = SplitRequest::new(&source).with_split_length(10);
    let result = container
        .split_interactor()
        .execute(&request, &password(), &SplitOptions::default())
        .await;

    assert!(matches!(result, Err(DomainError::ExtractionFailure(_))));
    assert_eq!(transcoder.calls().len(), 3);
    // Chunks before the failure stay; the failed one leaves no scratch file and nothing is encrypted
    assert_eq!(
        file_names(dir.path()),
        vec!["movie-1-of-5.mp4", "movie-2-of-5.mp4", "movie.mp4"]
    );
}

#[tokio::test]
async fn test_archive_failure_removes_written_containers() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "movie.mp4");
    let container = DefaultAppContainer::with_ports(
        Arc::new(FakeProbe::new(40.0)),
        Arc::new(FakeTranscoder::new()),
        Arc::new(FlakyCipher {
            inner: fast_cipher(),
            fail_for: "movie-3-of-4.mp4".to_string(),
        }),
        Arc::new(FsLocalAdapter::new()),
        &config(1),
    );

    let request = SplitRequest::new(&source).with_split_length(10);
    let result = container
        .split_interactor()
        .execute(&request, &password(), &SplitOptions::default())
        .await;

    assert!(matches!(result, Err(DomainError::ArchiveFailure(_))));
    assert!(file_names(dir.path()).iter().all(|name| !name.ends_with(".aes")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_archive_failure_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "movie.mp4");
    // A slower key derivation keeps the other chunks encrypting after chunk 1 has failed
    let container = DefaultAppContainer::with_ports(
        Arc::new(FakeProbe::new(40.0)),
        Arc::new(FakeTranscoder::new()),
        Arc::new(FlakyCipher {
            inner: AesGcmCipher::with_kdf(KdfParams {
                memory_kib: 16 * 1024,
                iterations: 2,
                parallelism: 1,
            }),
            fail_for: "movie-1-of-4.mp4".to_string(),
        }),
        Arc::new(FsLocalAdapter::new()),
        &config(4),
    );

    let request = SplitRequest::new(&source).with_split_length(10);
    let result = container
        .split_interactor()
        .execute(&request, &password(), &SplitOptions::default())
        .await;

    assert!(matches!(result, Err(DomainError::ArchiveFailure(_))));
    let left = file_names(dir.path());
    assert!(
        left.iter().all(|name| !name.ends_with(".aes") && !name.starts_with(".splitvault-")),
        "left behind: {:?}",
        left
    );
}

#[tokio::test]
async fn test_archive_failure_keeps_containers_it_never_reached() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "movie.mp4");
    let earlier = dir.path().join("movie-4-of-4.mp4.aes");
    std::fs::write(&earlier, b"from an earlier run").unwrap();

    let container = DefaultAppContainer::with_ports(
        Arc::new(FakeProbe::new(40.0)),
        Arc::new(FakeTranscoder::new()),
        Arc::new(FlakyCipher {
            inner: fast_cipher(),
            fail_for: "movie-2-of-4.mp4".to_string(),
        }),
        Arc::new(FsLocalAdapter::new()),
        &config(1),
    );

    let request = SplitRequest::new(&source).with_split_length(10);
    let result = container
        .split_interactor()
        .execute(&request, &password(), &SplitOptions::default())
        .await;

    assert!(matches!(result, Err(DomainError::ArchiveFailure(_))));
    assert!(!dir.path().join("movie-1-of-4.mp4.aes").exists());
    assert_eq!(std::fs::read(&earlier).unwrap(), b"from an earlier run");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_run_keeps_index_order() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "movie.mp4");
    let container = container_with(
        Arc::new(FakeProbe::new(1_000.0)),
        Arc::new(FakeTranscoder::new()),
        4,
    );

    let request = SplitRequest::new(&source).with_chunk_count(12);
    let response = container
        .split_interactor()
        .execute(&request, &password(), &SplitOptions { verify: true, ..Default::default() })
        .await
        .unwrap();

    let indices: Vec<u64> = response.encrypted.iter().map(|sealed| sealed.index).collect();
    assert_eq!(indices, (1..=12).collect::<Vec<u64>>());
    let paths: Vec<PathBuf> = response.segments.iter().map(|s| s.output_path.clone()).collect();
    assert_eq!(paths[11], dir.path().join("movie-12-of-12.mp4"));
}

#[tokio::test]
async fn test_plan_with_manifest_is_side_effect_free() {
    let dir = TempDir::new().unwrap();
    let source = source_in(dir.path(), "lecture.webm");
    let manifest_path = dir.path().join("cuts.yaml");
    std::fs::write(
        &manifest_path,
        "segments:\n  - { start: 0, length: 90 }\n  - { start: \"05:00\", length: \"1:30\" }\n",
    )
    .unwrap();

    let transcoder = Arc::new(FakeTranscoder::new());
    let container = container_with(Arc::new(FakeProbe::new(600.0)), Arc::clone(&transcoder), 1);
    let descriptors = splitvault::planner::load_manifest(&manifest_path).unwrap();
    let request = SplitRequest::new(&source).with_manifest(descriptors);

    let summary = container.split_interactor().plan(&request).await.unwrap();
    assert_eq!(summary.plan.chunk_count(), 2);
    assert_eq!(summary.segments[1].start_seconds, 300.0);
    assert_eq!(summary.segments[1].length_seconds, 90.0);
    assert_eq!(
        summary.segments[1].output_path,
        Path::new(dir.path()).join("lecture-2-of-2.webm")
    );
    assert!(transcoder.calls().is_empty());
    assert_eq!(file_names(dir.path()), vec!["cuts.yaml", "lecture.webm"]);
}
