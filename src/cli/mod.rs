//! CLI module for splitvault
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

pub mod args;
pub mod commands;

/// splitvault
///
/// Splits a video into time-bounded segments with ffmpeg and stores an
/// encrypted-at-rest copy of every segment.
#[derive(Parser, Debug)]
#[command(name = "splitvault")]
#[command(about = "Split videos into segments and encrypt every segment at rest")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level or filter directive
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Configuration file (default: ./splitvault.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a video, encrypt every segment and optionally verify the containers
    Split(args::SplitArgs),
    /// Probe a video and print the chunk plan without writing anything
    Plan(args::PlanArgs),
    /// Restore plaintext segments from encrypted containers
    Decrypt(args::DecryptArgs),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Split(_) => "split",
            Commands::Plan(_) => "plan",
            Commands::Decrypt(_) => "decrypt",
        }
    }
}

/// Print `message` with the usage of `subcommand` and exit with clap's usage status
pub fn exit_with_usage(subcommand: &str, message: &str) -> ! {
    let mut command = Cli::command();
    command.build();
    let error = match command.find_subcommand_mut(subcommand) {
        Some(sub) => sub.error(ErrorKind::ValueValidation, message),
        None => command.error(ErrorKind::ValueValidation, message),
    };
    error.exit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_requires_exactly_one_criterion() {
        let none = Cli::try_parse_from(["splitvault", "split", "-f", "a.mp4", "--password", "x"]);
        assert!(none.is_err());

        let two = Cli::try_parse_from([
            "splitvault", "split", "-f", "a.mp4", "-s", "30", "-c", "4", "--password", "x",
        ]);
        assert!(two.is_err());

        let one = Cli::try_parse_from(["splitvault", "split", "-f", "a.mp4", "-s", "30", "--password", "x"]);
        assert!(one.is_ok());
    }

    #[test]
    fn test_size_suffixes_and_negative_lengths() {
        let cli = Cli::try_parse_from(["splitvault", "plan", "-f", "a.mp4", "-S", "25M"]).unwrap();
        match cli.command {
            Commands::Plan(args) => assert_eq!(args.source.split_filesize, Some(25_000_000)),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["splitvault", "plan", "-f", "a.mp4", "-s", "-5"]).unwrap();
        match cli.command {
            Commands::Plan(args) => assert_eq!(args.source.split_size, Some(-5)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_extra_args_accept_leading_dashes() {
        let cli = Cli::try_parse_from([
            "splitvault", "plan", "-f", "a.mp4", "-s", "30", "-e", "-threads 8", "-e", "-movflags +faststart",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan(args) => assert_eq!(args.source.extra.len(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
