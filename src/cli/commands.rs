//! Command implementations

use anyhow::{Context, Result};
use tracing::info;

use crate::app::{AppContainer, SplitOptions};
use crate::cli::args::{DecryptArgs, PlanArgs, SourceArgs, SplitArgs};
use crate::cli::{Cli, Commands};
use crate::config_initialization::{AppConfig, ConfigOverrides};
use crate::domain::errors::DomainError;
use crate::domain::model::{CodecSettings, SplitRequest};
use crate::planner::load_manifest;

/// CLI values that take part in the configuration hierarchy
pub fn config_overrides(cli: &Cli) -> ConfigOverrides {
    let mut overrides = ConfigOverrides {
        log_level: cli.log_level.clone(),
        log_format: cli.log_format.clone(),
        ..Default::default()
    };

    let source = match &cli.command {
        Commands::Split(args) => {
            overrides.buffer_size = args.buffer_size;
            overrides.jobs = args.jobs;
            overrides.verify = args.verify.then_some(true);
            Some(&args.source)
        }
        Commands::Plan(args) => Some(&args.source),
        Commands::Decrypt(args) => {
            overrides.buffer_size = args.buffer_size;
            None
        }
    };

    if let Some(source) = source {
        overrides.filesize_factor = source.filesize_factor;
        overrides.chunk_strategy = source.chunk_strategy;
        overrides.video_codec = source.vcodec.clone();
        overrides.audio_codec = source.acodec.clone();
    }
    overrides
}

/// Split every `--extra` value into shell words
pub fn split_extra_args(values: &[String]) -> Result<Vec<String>, DomainError> {
    let mut args = Vec::new();
    for value in values {
        let words = shlex::split(value).ok_or_else(|| {
            DomainError::InvalidRequest(format!("Unbalanced quotes in extra arguments: {}", value))
        })?;
        args.extend(words);
    }
    Ok(args)
}

/// Turn the source arguments and resolved configuration into a split request
pub fn build_request(source: &SourceArgs, config: &AppConfig) -> Result<SplitRequest, DomainError> {
    let mut request = SplitRequest::new(&source.file).with_codecs(CodecSettings {
        video_codec: config.video_codec.clone(),
        audio_codec: config.audio_codec.clone(),
        extra_args: split_extra_args(&source.extra)?,
    });
    request.split_length_seconds = source.split_size;
    request.split_chunk_count = source.split_chunks;
    request.split_target_bytes = source.split_filesize;
    request.filesize_factor = config.filesize_factor;
    request.chunk_strategy = config.chunk_strategy;

    if let Some(path) = &source.manifest {
        request.manifest = Some(load_manifest(path)?);
    }
    Ok(request)
}

/// Execute the split command
pub async fn split(container: &dyn AppContainer, args: &SplitArgs, config: &AppConfig) -> Result<()> {
    let request = build_request(&args.source, config)?;
    let options = SplitOptions {
        verify: config.verify,
        remove_plaintext: args.remove_plaintext,
        report_path: args.report.clone(),
    };

    let response = container
        .split_interactor()
        .execute(&request, &args.password, &options)
        .await
        .with_context(|| format!("Failed to split {}", args.source.file.display()))?;

    for segment in &response.encrypted {
        println!("{}", segment.encrypted_path.display());
    }
    info!("{} segments secured", response.encrypted.len());
    Ok(())
}

/// Execute the plan command
pub async fn plan(container: &dyn AppContainer, args: &PlanArgs, config: &AppConfig) -> Result<()> {
    let request = build_request(&args.source, config)?;
    let summary = container
        .split_interactor()
        .plan(&request)
        .await
        .with_context(|| format!("Failed to plan {}", args.source.file.display()))?;

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{}", summary.to_table());
    }
    Ok(())
}

/// Execute the decrypt command
pub async fn decrypt(container: &dyn AppContainer, args: &DecryptArgs) -> Result<()> {
    let restored = container
        .decrypt_interactor()
        .execute(&args.path, &args.password, args.force)
        .await
        .with_context(|| format!("Failed to decrypt {}", args.path.display()))?;

    for segment in &restored {
        println!("{}", segment.plaintext_path.display());
    }
    Ok(())
}

/// Run the parsed command line
pub async fn dispatch(cli: &Cli, container: &dyn AppContainer, config: &AppConfig) -> Result<()> {
    match &cli.command {
        Commands::Split(args) => split(container, args, config).await,
        Commands::Plan(args) => plan(container, args, config).await,
        Commands::Decrypt(args) => decrypt(container, args).await,
    }
}
