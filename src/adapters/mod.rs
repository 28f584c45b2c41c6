// Adapters - External system implementations

pub mod cipher_aes;
pub mod exec_ffmpeg;
pub mod fs_local;
pub mod probe_ffprobe;
pub mod toml_config;

// Re-export adapters
pub use cipher_aes::{AesGcmCipher, KdfParams};
pub use exec_ffmpeg::FFmpegAdapter;
pub use fs_local::FsLocalAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use toml_config::{FileConfig, TomlConfigAdapter};
