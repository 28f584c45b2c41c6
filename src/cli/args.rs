//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args};
use clap_num::si_number;

use crate::domain::model::{ChunkStrategy, Password};

fn parse_password(secret: &str) -> Result<Password, String> {
    Password::new(secret).map_err(|e| e.to_string())
}

/// Source file, splitting criterion and planning knobs shared by `split` and `plan`
#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("criterion")
        .required(true)
        .args(["split_size", "split_chunks", "split_filesize", "manifest"])
))]
pub struct SourceArgs {
    /// Video file to split
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,

    /// Chunk length in seconds
    #[arg(short = 's', long, allow_negative_numbers = true)]
    pub split_size: Option<i64>,

    /// Number of chunks
    #[arg(short = 'c', long)]
    pub split_chunks: Option<u64>,

    /// Approximate chunk size in bytes; SI suffixes such as 25M are accepted
    #[arg(short = 'S', long, value_parser = si_number::<u64>)]
    pub split_filesize: Option<u64>,

    /// JSON or YAML file listing explicit start/length pairs
    #[arg(short = 'm', long)]
    pub manifest: Option<PathBuf>,

    /// Fraction of the size target actually aimed for, in (0, 1]
    #[arg(long)]
    pub filesize_factor: Option<f64>,

    /// How a size target becomes chunks
    #[arg(long, value_enum)]
    pub chunk_strategy: Option<ChunkStrategy>,

    /// Video codec passed to the transcoder
    #[arg(short = 'v', long)]
    pub vcodec: Option<String>,

    /// Audio codec passed to the transcoder
    #[arg(short = 'a', long)]
    pub acodec: Option<String>,

    /// Extra transcoder arguments, split into shell words; repeatable
    #[arg(short = 'e', long = "extra", allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

/// Arguments for the split command
#[derive(Args, Debug)]
pub struct SplitArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Password the segments are encrypted with
    #[arg(long, env = "SPLITVAULT_PASSWORD", hide_env_values = true, value_parser = parse_password)]
    pub password: Password,

    /// Cipher streaming buffer in bytes
    #[arg(long, value_parser = si_number::<usize>)]
    pub buffer_size: Option<usize>,

    /// Parallel workers for extraction and encryption; 0 uses every CPU
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Decrypt every container again and compare it with its segment
    #[arg(long)]
    pub verify: bool,

    /// Delete plaintext segments once they are encrypted
    #[arg(long)]
    pub remove_plaintext: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the decrypt command
#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Container file, or directory searched recursively for containers
    pub path: PathBuf,

    /// Password the containers were encrypted with
    #[arg(long, env = "SPLITVAULT_PASSWORD", hide_env_values = true, value_parser = parse_password)]
    pub password: Password,

    /// Cipher streaming buffer in bytes
    #[arg(long, value_parser = si_number::<usize>)]
    pub buffer_size: Option<usize>,

    /// Overwrite existing plaintext files
    #[arg(long)]
    pub force: bool,
}
