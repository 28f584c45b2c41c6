// TOML config adapter - Configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::domain::errors::*;

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "splitvault.toml";

/// Values a configuration file may set. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub buffer_size: Option<usize>,
    pub filesize_factor: Option<f64>,
    pub chunk_strategy: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub jobs: Option<usize>,
    pub verify: Option<bool>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    #[serde(default)]
    splitvault: FileConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse the `[splitvault]` table of a configuration document
    pub fn parse(toml_content: &str) -> Result<FileConfig, DomainError> {
        let document: ConfigDocument = toml::from_str(toml_content)
            .map_err(|e| DomainError::BadConfig(format!("Failed to parse TOML config: {}", e)))?;
        Ok(document.splitvault)
    }

    /// Load an explicitly requested file, which must exist
    pub fn load(path: &Path) -> Result<FileConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::BadConfig(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| DomainError::BadConfig(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` if given, else the default file if it exists, else nothing
    pub fn discover(explicit: Option<&Path>) -> Result<Option<FileConfig>, DomainError> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            return Self::load(default_path).map(Some);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section() {
        let config = TomlConfigAdapter::parse(
            r#"
            [splitvault]
            log_level = "debug"
            buffer_size = 131072
            jobs = 4
            verify = true
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.buffer_size, Some(131_072));
        assert_eq!(config.jobs, Some(4));
        assert_eq!(config.verify, Some(true));
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")));
        assert_eq!(config.audio_codec, None);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(TomlConfigAdapter::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let unknown_key = TomlConfigAdapter::parse("[splitvault]\npassword = \"x\"\n");
        assert!(matches!(unknown_key, Err(DomainError::BadConfig(_))));

        let unknown_table = TomlConfigAdapter::parse("[clipper]\nlog_level = \"info\"\n");
        assert!(matches!(unknown_table, Err(DomainError::BadConfig(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = TomlConfigAdapter::discover(Some(Path::new("/nonexistent/splitvault.toml")));
        assert!(matches!(result, Err(DomainError::BadConfig(_))));
    }
}
