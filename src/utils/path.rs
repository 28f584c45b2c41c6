//! Path utilities

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::domain::errors::DomainError;
use crate::domain::model::ENCRYPTED_SUFFIX;

/// Directory a file lives in, `.` for bare file names
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Create a scratch file next to `final_path`.
///
/// The scratch file keeps `extension` so that tools which infer the output
/// format from the name still work. It is deleted on drop unless persisted.
pub fn scratch_file_for(final_path: &Path, extension: &str) -> Result<NamedTempFile, DomainError> {
    let suffix = if extension.is_empty() {
        ".part".to_string()
    } else {
        format!(".part.{}", extension)
    };

    tempfile::Builder::new()
        .prefix(".splitvault-")
        .suffix(&suffix)
        .tempfile_in(parent_dir(final_path))
        .map_err(|e| {
            DomainError::FsFail(format!(
                "Failed to create scratch file for {}: {}",
                final_path.display(),
                e
            ))
        })
}

/// Move a finished scratch file to its final name
pub fn persist_scratch(scratch: NamedTempFile, final_path: &Path) -> Result<(), DomainError> {
    scratch.persist(final_path).map_err(|e| {
        DomainError::FsFail(format!(
            "Failed to move output into place at {}: {}",
            final_path.display(),
            e.error
        ))
    })?;
    Ok(())
}

/// Plaintext path for an encrypted container (`clip.mp4.aes` -> `clip.mp4`)
pub fn plaintext_path_for(container: &Path) -> Option<PathBuf> {
    let extension = container.extension()?;
    if extension != ENCRYPTED_SUFFIX {
        return None;
    }
    let stem = container.file_stem()?;
    Some(container.with_file_name(stem))
}

/// Every encrypted container at or below `root`, sorted by path
pub fn collect_containers(root: &Path) -> Result<Vec<PathBuf>, DomainError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut containers = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| DomainError::FsFail(format!("Failed to walk {}: {}", root.display(), e)))?;
        if entry.file_type().is_file() && plaintext_path_for(entry.path()).is_some() {
            containers.push(entry.into_path());
        }
    }
    Ok(containers)
}
