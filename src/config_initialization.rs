//! Configuration initialization and hierarchy management
//!
//! Precedence, lowest first: defaults, TOML file, environment, CLI flags.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::adapters::toml_config::{FileConfig, TomlConfigAdapter};
use crate::domain::errors::DomainError;
use crate::domain::model::{ChunkStrategy, DEFAULT_FILESIZE_FACTOR};
use crate::utils::logging::{LogFormat, LoggingConfig};

pub const MIN_BUFFER_SIZE: usize = 1024;
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Fully resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub buffer_size: usize,
    pub filesize_factor: f64,
    pub chunk_strategy: ChunkStrategy,
    pub video_codec: String,
    pub audio_codec: String,
    /// Worker count; 0 means one per CPU
    pub jobs: usize,
    pub verify: bool,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            filesize_factor: DEFAULT_FILESIZE_FACTOR,
            chunk_strategy: ChunkStrategy::default(),
            video_codec: "copy".to_string(),
            audio_codec: "copy".to_string(),
            jobs: 1,
            verify: false,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

/// Values given on the command line; `None` keeps the lower layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub buffer_size: Option<usize>,
    pub filesize_factor: Option<f64>,
    pub chunk_strategy: Option<ChunkStrategy>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub jobs: Option<usize>,
    pub verify: Option<bool>,
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::BadConfig(format!("Invalid value for {}: {}", name, value)))
}

impl AppConfig {
    fn apply_file(&mut self, file: FileConfig) -> Result<(), DomainError> {
        if let Some(level) = file.log_level {
            self.logging.level = level;
        }
        if let Some(format) = file.log_format {
            self.logging.format = LogFormat::parse(&format)?;
        }
        if let Some(buffer_size) = file.buffer_size {
            self.buffer_size = buffer_size;
        }
        if let Some(factor) = file.filesize_factor {
            self.filesize_factor = factor;
        }
        if let Some(strategy) = file.chunk_strategy {
            self.chunk_strategy = ChunkStrategy::parse(&strategy)
                .map_err(|e| DomainError::BadConfig(e.to_string()))?;
        }
        if let Some(codec) = file.video_codec {
            self.video_codec = codec;
        }
        if let Some(codec) = file.audio_codec {
            self.audio_codec = codec;
        }
        if let Some(jobs) = file.jobs {
            self.jobs = jobs;
        }
        if let Some(verify) = file.verify {
            self.verify = verify;
        }
        if let Some(path) = file.ffmpeg_path {
            self.ffmpeg_path = path;
        }
        if let Some(path) = file.ffprobe_path {
            self.ffprobe_path = path;
        }
        Ok(())
    }

    /// Apply `SPLITVAULT_*` variables read through `lookup`
    pub fn apply_environment<F>(&mut self, lookup: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_overrides = 0;

        if let Some(level) = lookup("SPLITVAULT_LOG_LEVEL") {
            self.logging.level = level;
            env_overrides += 1;
        }
        if let Some(value) = lookup("SPLITVAULT_BUFFER_SIZE") {
            self.buffer_size = parse_env("SPLITVAULT_BUFFER_SIZE", &value)?;
            env_overrides += 1;
        }
        if let Some(value) = lookup("SPLITVAULT_JOBS") {
            self.jobs = parse_env("SPLITVAULT_JOBS", &value)?;
            env_overrides += 1;
        }
        if let Some(value) = lookup("SPLITVAULT_FILESIZE_FACTOR") {
            self.filesize_factor = parse_env("SPLITVAULT_FILESIZE_FACTOR", &value)?;
            env_overrides += 1;
        }
        if let Some(path) = lookup("SPLITVAULT_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(path);
            env_overrides += 1;
        }
        if let Some(path) = lookup("SPLITVAULT_FFPROBE") {
            self.ffprobe_path = PathBuf::from(path);
            env_overrides += 1;
        }

        if env_overrides > 0 {
            debug!("Applied {} environment variable overrides", env_overrides);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), DomainError> {
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if let Some(format) = &overrides.log_format {
            self.logging.format = LogFormat::parse(format)?;
        }
        if let Some(buffer_size) = overrides.buffer_size {
            self.buffer_size = buffer_size;
        }
        if let Some(factor) = overrides.filesize_factor {
            self.filesize_factor = factor;
        }
        if let Some(strategy) = overrides.chunk_strategy {
            self.chunk_strategy = strategy;
        }
        if let Some(codec) = &overrides.video_codec {
            self.video_codec = codec.clone();
        }
        if let Some(codec) = &overrides.audio_codec {
            self.audio_codec = codec.clone();
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
        if let Some(verify) = overrides.verify {
            self.verify = verify;
        }
        Ok(())
    }

    /// Reject values no layer should be able to set
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(DomainError::BadConfig(format!(
                "buffer_size must be between {} and {} bytes, got {}",
                MIN_BUFFER_SIZE, MAX_BUFFER_SIZE, self.buffer_size
            )));
        }
        if !(self.filesize_factor > 0.0 && self.filesize_factor <= 1.0) {
            return Err(DomainError::BadConfig(format!(
                "filesize_factor must be in (0, 1], got {}",
                self.filesize_factor
            )));
        }
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(DomainError::BadConfig("Codec names cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Worker count with `0` resolved to the number of CPUs
    pub fn effective_jobs(&self) -> usize {
        match self.jobs {
            0 => num_cpus::get().max(1),
            jobs => jobs,
        }
    }
}

/// Build the configuration from every layer
pub fn initialize_configuration_hierarchy(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<AppConfig, DomainError> {
    let mut config = AppConfig::default();

    if let Some(file) = TomlConfigAdapter::discover(config_path)? {
        config.apply_file(file)?;
    }
    config.apply_environment(|name| std::env::var(name).ok())?;
    config.apply_overrides(overrides)?;
    config.validate()?;

    info!(
        "Configuration: buffer {} bytes, {} job(s), verify {}",
        config.buffer_size,
        config.effective_jobs(),
        config.verify
    );
    Ok(config)
}
