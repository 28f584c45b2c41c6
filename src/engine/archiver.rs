//! Secure archiving of extracted segments
//!
//! Encrypts every segment into `{segment}.aes`, optionally proves each
//! container decrypts back to the segment, and restores plaintext from
//! containers. A failed run removes the containers it wrote.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{EncryptedSegment, Password, Segment};
use crate::engine::run_bounded;
use crate::ports::{CipherPort, FsPort};
use crate::utils::path::scratch_file_for;
use crate::utils::time::{as_millis_u64, format_elapsed};

/// Result of restoring one container
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredSegment {
    pub encrypted_path: PathBuf,
    pub plaintext_path: PathBuf,
    pub elapsed_ms: u64,
}

/// Encrypts, verifies and restores segment files
pub struct SecureArchiver {
    cipher_port: Arc<dyn CipherPort>,
    fs_port: Arc<dyn FsPort>,
    buffer_size: usize,
    jobs: usize,
}

impl SecureArchiver {
    pub fn new(cipher_port: Arc<dyn CipherPort>, fs_port: Arc<dyn FsPort>, buffer_size: usize, jobs: usize) -> Self {
        Self {
            cipher_port,
            fs_port,
            buffer_size,
            jobs,
        }
    }

    /// Encrypt every segment.
    ///
    /// On failure the containers of every segment this run started on are
    /// removed; containers of segments it never reached are left alone.
    pub async fn secure(
        &self,
        segments: &[Segment],
        password: &Password,
    ) -> Result<Vec<EncryptedSegment>, DomainError> {
        info!("Encrypting {} segments", segments.len());

        let cipher_port = Arc::clone(&self.cipher_port);
        let password = password.clone();
        let buffer_size = self.buffer_size;
        let started = Arc::new(Mutex::new(Vec::with_capacity(segments.len())));
        let started_task = Arc::clone(&started);

        let result = run_bounded(
            self.jobs,
            segments.to_vec(),
            move |segment| {
                let cipher_port = Arc::clone(&cipher_port);
                let password = password.clone();
                let started = Arc::clone(&started_task);
                async move {
                    started
                        .lock()
                        .await
                        .push(EncryptedSegment::container_path_for(&segment.output_path));
                    Self::secure_one(cipher_port.as_ref(), &segment, &password, buffer_size).await
                }
            },
            DomainError::ArchiveFailure,
        )
        .await;

        if result.is_err() {
            let containers = started.lock().await.clone();
            self.rollback(&containers).await;
        }
        result
    }

    async fn secure_one(
        cipher_port: &dyn CipherPort,
        segment: &Segment,
        password: &Password,
        buffer_size: usize,
    ) -> Result<EncryptedSegment, DomainError> {
        let encrypted_path = EncryptedSegment::container_path_for(&segment.output_path);
        let started = Instant::now();
        cipher_port
            .encrypt_file(&segment.output_path, &encrypted_path, password, buffer_size)
            .await?;
        let elapsed = started.elapsed();

        info!(
            "Encrypted {} in {}",
            encrypted_path.display(),
            format_elapsed(elapsed)
        );
        Ok(EncryptedSegment {
            index: segment.index,
            plaintext_path: segment.output_path.clone(),
            encrypted_path,
            elapsed_ms: as_millis_u64(elapsed),
        })
    }

    /// Decrypt every container into a scratch file and compare it with its segment.
    ///
    /// The plaintext segments are never overwritten. A mismatch removes this run's containers.
    pub async fn verify(&self, encrypted: &[EncryptedSegment], password: &Password) -> Result<(), DomainError> {
        info!("Verifying {} containers", encrypted.len());

        let cipher_port = Arc::clone(&self.cipher_port);
        let fs_port = Arc::clone(&self.fs_port);
        let password = password.clone();
        let buffer_size = self.buffer_size;

        let result = run_bounded(
            self.jobs,
            encrypted.to_vec(),
            move |segment| {
                let cipher_port = Arc::clone(&cipher_port);
                let fs_port = Arc::clone(&fs_port);
                let password = password.clone();
                async move {
                    Self::verify_one(cipher_port.as_ref(), fs_port.as_ref(), &segment, &password, buffer_size)
                        .await
                }
            },
            DomainError::ArchiveFailure,
        )
        .await;

        if let Err(e) = result {
            let containers: Vec<PathBuf> = encrypted.iter().map(|s| s.encrypted_path.clone()).collect();
            self.rollback(&containers).await;
            return Err(e);
        }
        Ok(())
    }

    async fn verify_one(
        cipher_port: &dyn CipherPort,
        fs_port: &dyn FsPort,
        segment: &EncryptedSegment,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError> {
        let extension = segment
            .plaintext_path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let scratch = scratch_file_for(&segment.plaintext_path, &extension)?;

        let started = Instant::now();
        cipher_port
            .decrypt_file(&segment.encrypted_path, scratch.path(), password, buffer_size)
            .await?;
        let elapsed = started.elapsed();

        if !fs_port.files_identical(&segment.plaintext_path, scratch.path()).await? {
            return Err(DomainError::ArchiveFailure(format!(
                "Verification failed: {} does not decrypt to {}",
                segment.encrypted_path.display(),
                segment.plaintext_path.display()
            )));
        }

        info!(
            "Verified {} in {}",
            segment.encrypted_path.display(),
            format_elapsed(elapsed)
        );
        Ok(())
    }

    /// Remove plaintext segments once their containers are in place
    pub async fn remove_plaintext(&self, encrypted: &[EncryptedSegment]) -> Result<(), DomainError> {
        for segment in encrypted {
            self.fs_port.delete_file(&segment.plaintext_path).await?;
            info!("Removed plaintext {}", segment.plaintext_path.display());
        }
        Ok(())
    }

    /// Decrypt one container to `destination`.
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub async fn restore(
        &self,
        container: &Path,
        destination: &Path,
        password: &Password,
        force: bool,
    ) -> Result<RestoredSegment, DomainError> {
        if !force && self.fs_port.file_exists(destination).await? {
            return Err(DomainError::FsFail(format!(
                "{} already exists, pass --force to overwrite it",
                destination.display()
            )));
        }

        let started = Instant::now();
        self.cipher_port
            .decrypt_file(container, destination, password, self.buffer_size)
            .await?;
        let elapsed = started.elapsed();

        info!(
            "Decrypted {} -> {} in {}",
            container.display(),
            destination.display(),
            format_elapsed(elapsed)
        );
        Ok(RestoredSegment {
            encrypted_path: container.to_path_buf(),
            plaintext_path: destination.to_path_buf(),
            elapsed_ms: as_millis_u64(elapsed),
        })
    }

    async fn rollback(&self, containers: &[PathBuf]) {
        for container in containers {
            match self.fs_port.file_exists(container).await {
                Ok(true) => {
                    if let Err(e) = self.fs_port.delete_file(container).await {
                        warn!("Failed to remove {}: {}", container.display(), e);
                    } else {
                        info!("Removed {}", container.display());
                    }
                }
                Ok(false) => {}
                Err(e) => warn!("Failed to check {}: {}", container.display(), e),
            }
        }
    }
}
