// Local filesystem adapter - File system operations on the host

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::ports::*;

const COMPARE_BUFFER: usize = 64 * 1024;

/// Local filesystem adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    pub fn new() -> Self {
        Self
    }

    fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn compare_files(left: &Path, right: &Path) -> Result<bool, DomainError> {
        let open = |path: &Path| {
            File::open(path)
                .map_err(|e| DomainError::FsFail(format!("Failed to open {}: {}", path.display(), e)))
        };
        let left_file = open(left)?;
        let right_file = open(right)?;

        let left_len = left_file.metadata()?.len();
        let right_len = right_file.metadata()?.len();
        if left_len != right_len {
            return Ok(false);
        }

        let mut left_reader = BufReader::new(left_file);
        let mut right_reader = BufReader::new(right_file);
        let mut left_buf = vec![0u8; COMPARE_BUFFER];
        let mut right_buf = vec![0u8; COMPARE_BUFFER];
        loop {
            let left_read = Self::read_block(&mut left_reader, &mut left_buf)?;
            let right_read = Self::read_block(&mut right_reader, &mut right_buf)?;
            if left_read != right_read || left_buf[..left_read] != right_buf[..right_read] {
                return Ok(false);
            }
            if left_read == 0 {
                return Ok(true);
            }
        }
    }
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError> {
        Ok(file_path.is_file())
    }

    async fn get_file_size(&self, file_path: &Path) -> Result<u64, DomainError> {
        let metadata = fs::metadata(file_path).map_err(|e| {
            DomainError::FsFail(format!("Failed to get file size of {}: {}", file_path.display(), e))
        })?;
        Ok(metadata.len())
    }

    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError> {
        match fs::remove_file(file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::FsFail(format!(
                "Failed to delete {}: {}",
                file_path.display(),
                e
            ))),
        }
    }

    async fn files_identical(&self, left: &Path, right: &Path) -> Result<bool, DomainError> {
        let left: PathBuf = left.to_path_buf();
        let right: PathBuf = right.to_path_buf();
        tokio::task::spawn_blocking(move || Self::compare_files(&left, &right))
            .await
            .map_err(|e| DomainError::FsFail(format!("Comparison task failed: {}", e)))?
    }
}
