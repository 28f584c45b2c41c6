// Decrypt interactor - Restores plaintext segments from containers

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::archiver::RestoredSegment;
use crate::engine::SecureArchiver;
use crate::ports::*;
use crate::utils::path::{collect_containers, plaintext_path_for};

/// Interactor for the decrypt use case
pub struct DecryptInteractor {
    archiver: SecureArchiver,
}

impl DecryptInteractor {
    pub fn new(cipher_port: Arc<dyn CipherPort>, fs_port: Arc<dyn FsPort>, buffer_size: usize) -> Self {
        Self {
            archiver: SecureArchiver::new(cipher_port, fs_port, buffer_size, 1),
        }
    }

    /// Restore one container, or every container below a directory, next to itself
    pub async fn execute(
        &self,
        target: &Path,
        password: &Password,
        force: bool,
    ) -> Result<Vec<RestoredSegment>, DomainError> {
        let containers = collect_containers(target)?;
        if containers.is_empty() {
            return Err(DomainError::InvalidRequest(format!(
                "No .{} containers found under {}",
                ENCRYPTED_SUFFIX,
                target.display()
            )));
        }

        let mut restored = Vec::with_capacity(containers.len());
        for container in &containers {
            let destination = plaintext_path_for(container).ok_or_else(|| {
                DomainError::InvalidRequest(format!(
                    "{} is not a .{} container",
                    container.display(),
                    ENCRYPTED_SUFFIX
                ))
            })?;
            restored.push(
                self.archiver
                    .restore(container, &destination, password, force)
                    .await?,
            );
        }

        info!("Restored {} segment(s)", restored.len());
        Ok(restored)
    }
}
