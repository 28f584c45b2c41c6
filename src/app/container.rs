use std::sync::Arc;

use crate::adapters::{AesGcmCipher, FFmpegAdapter, FFprobeAdapter, FsLocalAdapter};
use crate::app::{decrypt_interactor::DecryptInteractor, split_interactor::SplitInteractor};
use crate::config_initialization::AppConfig;
use crate::ports::{CipherPort, FsPort, ProbePort, TranscodePort};

pub trait AppContainer: Send + Sync {
    fn split_interactor(&self) -> Arc<SplitInteractor>;
    fn decrypt_interactor(&self) -> Arc<DecryptInteractor>;
}

pub struct DefaultAppContainer {
    split_interactor: Arc<SplitInteractor>,
    decrypt_interactor: Arc<DecryptInteractor>,
}

impl DefaultAppContainer {
    /// Wire the production adapters
    pub fn new(config: &AppConfig) -> Self {
        Self::with_ports(
            Arc::new(FFprobeAdapter::new(config.ffprobe_path.clone())),
            Arc::new(FFmpegAdapter::new(config.ffmpeg_path.clone())),
            Arc::new(AesGcmCipher::new()),
            Arc::new(FsLocalAdapter::new()),
            config,
        )
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        probe_port: Arc<dyn ProbePort>,
        transcode_port: Arc<dyn TranscodePort>,
        cipher_port: Arc<dyn CipherPort>,
        fs_port: Arc<dyn FsPort>,
        config: &AppConfig,
    ) -> Self {
        let jobs = config.effective_jobs();

        let split_interactor = Arc::new(SplitInteractor::new(
            probe_port,
            transcode_port,
            Arc::clone(&cipher_port),
            Arc::clone(&fs_port),
            config.buffer_size,
            jobs,
        ));

        let decrypt_interactor = Arc::new(DecryptInteractor::new(cipher_port, fs_port, config.buffer_size));

        Self {
            split_interactor,
            decrypt_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn split_interactor(&self) -> Arc<SplitInteractor> {
        Arc::clone(&self.split_interactor)
    }

    fn decrypt_interactor(&self) -> Arc<DecryptInteractor> {
        Arc::clone(&self.decrypt_interactor)
    }
}
