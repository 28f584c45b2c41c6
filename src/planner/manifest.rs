//! Manifest loading
//!
//! A manifest lists explicit `(start, length)` pairs and bypasses the
//! arithmetic planner. Both JSON and YAML are accepted:
//!
//! ```json
//! { "segments": [ { "start": 0, "length": 30 }, { "start": "01:00", "length": "45.5" } ] }
//! ```
//!
//! A bare top-level list of entries is accepted as well.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::{SegmentDescriptor, TimeSpec};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestDocument {
    Wrapped { segments: Vec<ManifestEntry> },
    Bare(Vec<ManifestEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    #[serde(alias = "start_time")]
    start: TimeValue,
    length: TimeValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeValue {
    Seconds(f64),
    Text(String),
}

impl TimeValue {
    fn to_time_spec(&self) -> Result<TimeSpec, DomainError> {
        match self {
            TimeValue::Seconds(seconds) => TimeSpec::parse(&seconds.to_string()),
            TimeValue::Text(text) => TimeSpec::parse(text),
        }
    }
}

/// Manifest encodings, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Yaml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Result<Self, DomainError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(ManifestFormat::Json),
            "yaml" | "yml" => Ok(ManifestFormat::Yaml),
            _ => Err(DomainError::InvalidRequest(format!(
                "Unsupported manifest format for {}: expected .json, .yaml or .yml",
                path.display()
            ))),
        }
    }
}

/// Parse manifest text into segment descriptors
pub fn parse_manifest(content: &str, format: ManifestFormat) -> Result<Vec<SegmentDescriptor>, DomainError> {
    let document: ManifestDocument = match format {
        ManifestFormat::Json => serde_json::from_str(content)
            .map_err(|e| DomainError::InvalidRequest(format!("Malformed JSON manifest: {}", e)))?,
        ManifestFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| DomainError::InvalidRequest(format!("Malformed YAML manifest: {}", e)))?,
    };

    let entries = match document {
        ManifestDocument::Wrapped { segments } => segments,
        ManifestDocument::Bare(entries) => entries,
    };

    entries
        .iter()
        .map(|entry| SegmentDescriptor::new(entry.start.to_time_spec()?, entry.length.to_time_spec()?))
        .collect()
}

/// Read and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Vec<SegmentDescriptor>, DomainError> {
    let format = ManifestFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| DomainError::FsFail(format!("Failed to read manifest {}: {}", path.display(), e)))?;

    let descriptors = parse_manifest(&content, format)?;
    info!("Loaded {} segment descriptors from {}", descriptors.len(), path.display());
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_manifest() {
        let content = r#"{ "segments": [
            { "start": 0, "length": 30 },
            { "start": "01:00", "length": "45.5" }
        ] }"#;
        let descriptors = parse_manifest(content, ManifestFormat::Json).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].start.seconds, 0.0);
        assert_eq!(descriptors[0].length.seconds, 30.0);
        assert_eq!(descriptors[1].start.seconds, 60.0);
        assert_eq!(descriptors[1].length.seconds, 45.5);
    }

    #[test]
    fn test_parse_yaml_bare_list() {
        let content = "- start_time: 10\n  length: 5\n- start: 00:00:20\n  length: 5\n";
        let descriptors = parse_manifest(content, ManifestFormat::Yaml).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].start.seconds, 10.0);
        assert_eq!(descriptors[1].start.seconds, 20.0);
    }

    #[test]
    fn test_rejects_bad_entries() {
        let zero_length = r#"[ { "start": 0, "length": 0 } ]"#;
        assert!(parse_manifest(zero_length, ManifestFormat::Json).is_err());

        let negative_start = r#"[ { "start": -5, "length": 10 } ]"#;
        assert!(parse_manifest(negative_start, ManifestFormat::Json).is_err());

        let unknown_field = r#"[ { "start": 0, "length": 10, "rename_to": "x.mp4" } ]"#;
        assert!(parse_manifest(unknown_field, ManifestFormat::Json).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ManifestFormat::from_path(Path::new("m.JSON")).unwrap(), ManifestFormat::Json);
        assert_eq!(ManifestFormat::from_path(Path::new("m.yml")).unwrap(), ManifestFormat::Yaml);
        assert!(ManifestFormat::from_path(Path::new("m.csv")).is_err());
    }
}
