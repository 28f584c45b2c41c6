// Domain rules - Business logic and policies

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::errors::*;

/// Ceiling division over positive integers.
///
/// Never truncates: under-allocating a chunk length would leave the tail of
/// the media unscheduled.
pub fn ceildiv(a: u64, b: u64) -> Result<u64, DomainError> {
    if b == 0 {
        return Err(DomainError::InvalidRequest("Division by zero while planning".to_string()));
    }
    Ok(a.div_ceil(b))
}

/// Naming rules for segment output files
pub struct SegmentNaming {
    directory: PathBuf,
    basename: String,
    extension: String,
}

impl SegmentNaming {
    /// Split the source file name on its last dot
    pub fn for_source(source: &Path) -> Result<Self, DomainError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| DomainError::NoExtension(source.display().to_string()))?
            .to_string_lossy()
            .into_owned();

        let (basename, extension) = file_name
            .rsplit_once('.')
            .ok_or_else(|| DomainError::NoExtension(file_name.clone()))?;

        Ok(Self {
            directory: source.parent().map(Path::to_path_buf).unwrap_or_default(),
            basename: basename.to_string(),
            extension: extension.to_string(),
        })
    }

    /// `{basename}-{index}-of-{count}.{ext}` next to the source
    pub fn output_path(&self, index: u64, chunk_count: u64) -> PathBuf {
        self.directory.join(format!(
            "{}-{}-of-{}.{}",
            self.basename, index, chunk_count, self.extension
        ))
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// All output paths of a run, checked for collisions
    pub fn output_paths(&self, chunk_count: u64) -> Result<Vec<PathBuf>, DomainError> {
        let paths: Vec<PathBuf> = (1..=chunk_count)
            .map(|index| self.output_path(index, chunk_count))
            .collect();

        let mut seen = HashSet::with_capacity(paths.len());
        for path in &paths {
            if !seen.insert(path) {
                return Err(DomainError::InvalidRequest(format!(
                    "Output path collision: {}",
                    path.display()
                )));
            }
        }
        Ok(paths)
    }
}
