// Unit tests for domain models

use super::*;

#[test]
fn test_time_spec_parse_seconds() {
    let time = TimeSpec::parse("123.456").unwrap();
    assert_eq!(time.seconds, 123.456);
}

#[test]
fn test_time_spec_parse_mm_ss() {
    let time = TimeSpec::parse("01:30.5").unwrap();
    assert_eq!(time.seconds, 90.5);
}

#[test]
fn test_time_spec_parse_hh_mm_ss() {
    let time = TimeSpec::parse("01:02:03.5").unwrap();
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_invalid() {
    assert!(TimeSpec::parse("invalid").is_err());
    assert!(TimeSpec::parse("00:60").is_err()); // Seconds overflow
    assert!(TimeSpec::parse("01:60:00").is_err()); // Minutes overflow
    assert!(TimeSpec::parse("-10").is_err()); // Negative time
    assert!(TimeSpec::parse("1:2:3:4").is_err());
}

#[test]
fn test_time_spec_display() {
    assert_eq!(TimeSpec::from_seconds(3723.456).to_string(), "1:02:03.456");
    assert_eq!(TimeSpec::from_seconds(123.456).to_string(), "2:03.456");
}

#[test]
fn test_chunk_strategy_parsing() {
    assert_eq!(ChunkStrategy::parse("eager").unwrap(), ChunkStrategy::Eager);
    assert_eq!(ChunkStrategy::parse("EVEN").unwrap(), ChunkStrategy::Even);
    assert!(ChunkStrategy::parse("greedy").is_err());
    assert_eq!(ChunkStrategy::default(), ChunkStrategy::Eager);
}

#[test]
fn test_criterion_rejects_non_positive_length() {
    for length in [0, -1, -30] {
        let request = SplitRequest::new("movie.mp4").with_split_length(length);
        assert!(matches!(request.criterion(), Err(DomainError::InvalidRequest(_))));
    }
}

#[test]
fn test_criterion_resolution_order() {
    let descriptors = vec![
        SegmentDescriptor::new(TimeSpec::from_seconds(0.0), TimeSpec::from_seconds(10.0)).unwrap(),
        SegmentDescriptor::new(TimeSpec::from_seconds(10.0), TimeSpec::from_seconds(10.0)).unwrap(),
    ];

    // Length wins over everything else
    let request = SplitRequest::new("movie.mp4")
        .with_chunk_count(4)
        .with_target_size(1000, 1.0, ChunkStrategy::Even)
        .with_manifest(descriptors.clone())
        .with_split_length(30);
    assert_eq!(request.criterion().unwrap(), SplitCriterion::Length(30));

    // Manifest wins over size and count
    let request = SplitRequest::new("movie.mp4")
        .with_chunk_count(4)
        .with_target_size(1000, 1.0, ChunkStrategy::Even)
        .with_manifest(descriptors.clone());
    assert_eq!(request.criterion().unwrap(), SplitCriterion::Manifest(descriptors));

    // Size wins over count
    let request = SplitRequest::new("movie.mp4")
        .with_chunk_count(4)
        .with_target_size(1000, 0.5, ChunkStrategy::Even);
    assert_eq!(
        request.criterion().unwrap(),
        SplitCriterion::TargetSize {
            target_bytes: 1000,
            filesize_factor: 0.5,
            strategy: ChunkStrategy::Even,
        }
    );

    let request = SplitRequest::new("movie.mp4").with_chunk_count(4);
    assert_eq!(request.criterion().unwrap(), SplitCriterion::ChunkCount(4));
}

#[test]
fn test_criterion_missing() {
    let request = SplitRequest::new("movie.mp4");
    assert!(matches!(request.criterion(), Err(DomainError::InvalidRequest(_))));
}

#[test]
fn test_criterion_rejects_bad_factor() {
    for factor in [0.0, -0.5, 1.5, f64::NAN] {
        let request = SplitRequest::new("movie.mp4").with_target_size(1000, factor, ChunkStrategy::Eager);
        assert!(request.criterion().is_err(), "factor {} accepted", factor);
    }
}

#[test]
fn test_media_meta_truncates_duration() {
    let meta = MediaMeta::from_probe(125.97, 4096).unwrap();
    assert_eq!(meta.duration_seconds, 125);
    assert_eq!(meta.probed_seconds, 125.97);
    assert_eq!(meta.size_bytes, 4096);
}

#[test]
fn test_media_meta_rejects_sub_second_media() {
    assert!(matches!(
        MediaMeta::from_probe(0.4, 10),
        Err(DomainError::ProbeFailure(_))
    ));
    assert!(MediaMeta::from_probe(f64::NAN, 10).is_err());
}

#[test]
fn test_chunk_plan_rejects_single_chunk() {
    assert!(matches!(
        ChunkPlan::uniform(1, 30, PlanSource::SplitLength),
        Err(DomainError::TooShort(_))
    ));
    assert!(matches!(
        ChunkPlan::uniform(3, 0, PlanSource::SplitLength),
        Err(DomainError::InvalidRequest(_))
    ));
}

#[test]
fn test_uniform_plan_bounds() {
    let plan = ChunkPlan::uniform(5, 30, PlanSource::SplitLength).unwrap();
    let bounds = plan.bounds();
    assert_eq!(bounds.len(), 5);
    assert_eq!(bounds[0].index, 1);
    assert_eq!(bounds[0].start.seconds, 0.0);
    assert_eq!(bounds[4].index, 5);
    assert_eq!(bounds[4].start.seconds, 120.0);
    // The last chunk keeps the uniform length, the transcoder clamps it
    assert!(bounds.iter().all(|b| b.length.seconds == 30.0));
    assert_eq!(plan.chunk_length_seconds(), Some(30));
}

#[test]
fn test_encrypted_container_path() {
    let path = EncryptedSegment::container_path_for(Path::new("/media/clip-1-of-3.mp4"));
    assert_eq!(path, PathBuf::from("/media/clip-1-of-3.mp4.aes"));
}

#[test]
fn test_password_is_redacted() {
    let password = Password::new("hunter2").unwrap();
    assert_eq!(format!("{:?}", password), "Password(<redacted>)");
    assert_eq!(password.expose(), b"hunter2");
    assert!(Password::new("").is_err());
}
