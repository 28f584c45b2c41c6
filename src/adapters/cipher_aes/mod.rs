//! AES-256-GCM container adapter
//!
//! Container layout:
//!
//! ```text
//! header: magic "SVAES\x01" | argon2 m_kib u32 | t u32 | p u32 | salt [16] | nonce prefix [8] | chunk size u32
//! frame:  flag u8 (1 = final) | ciphertext length u32 | ciphertext + tag
//! ```
//!
//! Integers are little endian. Each frame is sealed with the nonce
//! `prefix || counter (u32 big endian)` and authenticates the header, its
//! counter and its flag, so frames cannot be reordered, dropped or cut off.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::path::{persist_scratch, scratch_file_for};

const MAGIC: &[u8; 6] = b"SVAES\x01";
const SALT_LEN: usize = 16;
const NONCE_PREFIX_LEN: usize = 8;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + 12 + SALT_LEN + NONCE_PREFIX_LEN + 4;
const FRAME_HEADER_LEN: usize = 5;
const FLAG_MORE: u8 = 0;
const FLAG_FINAL: u8 = 1;
const MAX_CHUNK_SIZE: u32 = 64 * 1024 * 1024;
const MAX_MEMORY_KIB: u32 = 256 * 1024;

/// Argon2id cost parameters stored in every container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Bounds accepted when reading a header, so a hostile file cannot demand unbounded work
    fn validate(&self) -> Result<(), DomainError> {
        let in_bounds = (8..=MAX_MEMORY_KIB).contains(&self.memory_kib)
            && (1..=10).contains(&self.iterations)
            && (1..=16).contains(&self.parallelism);
        if !in_bounds {
            return Err(DomainError::ArchiveFailure(format!(
                "Container declares unsupported key derivation parameters: {:?}",
                self
            )));
        }
        Ok(())
    }

    fn derive_key(&self, password: &Password, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, DomainError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, Some(32))
            .map_err(|e| DomainError::ArchiveFailure(format!("Invalid key derivation parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(password.expose(), salt, &mut key[..])
            .map_err(|e| DomainError::ArchiveFailure(format!("Key derivation failed: {}", e)))?;
        Ok(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ContainerHeader {
    kdf: KdfParams,
    salt: [u8; SALT_LEN],
    nonce_prefix: [u8; NONCE_PREFIX_LEN],
    chunk_size: u32,
}

impl ContainerHeader {
    fn generate(kdf: KdfParams, chunk_size: u32) -> Self {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce_prefix);
        Self {
            kdf,
            salt,
            nonce_prefix,
            chunk_size,
        }
    }

    fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..6].copy_from_slice(MAGIC);
        bytes[6..10].copy_from_slice(&self.kdf.memory_kib.to_le_bytes());
        bytes[10..14].copy_from_slice(&self.kdf.iterations.to_le_bytes());
        bytes[14..18].copy_from_slice(&self.kdf.parallelism.to_le_bytes());
        bytes[18..34].copy_from_slice(&self.salt);
        bytes[34..42].copy_from_slice(&self.nonce_prefix);
        bytes[42..46].copy_from_slice(&self.chunk_size.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Result<Self, DomainError> {
        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(DomainError::ArchiveFailure(
                "Not a splitvault container (bad magic)".to_string(),
            ));
        }
        let u32_at = |offset: usize| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&bytes[offset..offset + 4]);
            u32::from_le_bytes(word)
        };

        let kdf = KdfParams {
            memory_kib: u32_at(6),
            iterations: u32_at(10),
            parallelism: u32_at(14),
        };
        kdf.validate()?;

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[18..18 + SALT_LEN]);
        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        nonce_prefix.copy_from_slice(&bytes[34..34 + NONCE_PREFIX_LEN]);

        let chunk_size = u32_at(42);
        if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            return Err(DomainError::ArchiveFailure(format!(
                "Container declares an invalid chunk size: {}",
                chunk_size
            )));
        }

        Ok(Self {
            kdf,
            salt,
            nonce_prefix,
            chunk_size,
        })
    }

    fn nonce(&self, counter: u32) -> [u8; 12] {
        let mut nonce = [0u8; 12];
        nonce[..NONCE_PREFIX_LEN].copy_from_slice(&self.nonce_prefix);
        nonce[NONCE_PREFIX_LEN..].copy_from_slice(&counter.to_be_bytes());
        nonce
    }
}

fn frame_aad(header: &[u8; HEADER_LEN], counter: u32, flag: u8) -> Vec<u8> {
    let mut aad = Vec::with_capacity(HEADER_LEN + 5);
    aad.extend_from_slice(header);
    aad.extend_from_slice(&counter.to_be_bytes());
    aad.push(flag);
    aad
}

/// Read until `buf` is full or the reader is exhausted
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, DomainError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DomainError::FsFail(format!("Read failed: {}", e))),
        }
    }
    Ok(filled)
}

fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), DomainError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => DomainError::ArchiveFailure("Container is truncated".to_string()),
        _ => DomainError::FsFail(format!("Read failed: {}", e)),
    })
}

fn write_all<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<(), DomainError> {
    writer
        .write_all(bytes)
        .map_err(|e| DomainError::FsFail(format!("Write failed: {}", e)))
}

/// AES-256-GCM cipher with an Argon2id password key
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher {
    kdf: KdfParams,
}

impl AesGcmCipher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use different key derivation costs for new containers
    pub fn with_kdf(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    /// Encrypt everything `reader` yields into `writer`
    pub fn encrypt_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        password: &Password,
        chunk_size: usize,
    ) -> Result<(), DomainError> {
        let chunk_size = u32::try_from(chunk_size)
            .ok()
            .filter(|size| *size > 0 && *size <= MAX_CHUNK_SIZE)
            .ok_or_else(|| DomainError::BadConfig(format!("Invalid cipher buffer size: {}", chunk_size)))?;

        let header = ContainerHeader::generate(self.kdf, chunk_size);
        let header_bytes = header.to_bytes();
        let key = header.kdf.derive_key(password, &header.salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| DomainError::ArchiveFailure(format!("Invalid key: {}", e)))?;

        write_all(&mut writer, &header_bytes)?;

        let mut current = Zeroizing::new(vec![0u8; chunk_size as usize]);
        let mut next = Zeroizing::new(vec![0u8; chunk_size as usize]);
        let mut current_len = read_chunk(&mut reader, &mut current)?;
        let mut counter: u32 = 0;

        loop {
            // One chunk of lookahead tells us whether this frame is the last one
            let next_len = read_chunk(&mut reader, &mut next)?;
            let flag = if next_len == 0 { FLAG_FINAL } else { FLAG_MORE };

            let nonce = header.nonce(counter);
            let aad = frame_aad(&header_bytes, counter, flag);
            let ciphertext = cipher
                .encrypt(
                    Nonce::from_slice(&nonce),
                    Payload {
                        msg: &current[..current_len],
                        aad: &aad,
                    },
                )
                .map_err(|_| DomainError::ArchiveFailure("Encryption failed".to_string()))?;

            write_all(&mut writer, &[flag])?;
            write_all(&mut writer, &(ciphertext.len() as u32).to_le_bytes())?;
            write_all(&mut writer, &ciphertext)?;

            if flag == FLAG_FINAL {
                break;
            }
            std::mem::swap(&mut current, &mut next);
            current_len = next_len;
            counter = counter
                .checked_add(1)
                .ok_or_else(|| DomainError::ArchiveFailure("Input too large for one container".to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| DomainError::FsFail(format!("Write failed: {}", e)))?;
        debug!("Sealed {} frames", u64::from(counter) + 1);
        Ok(())
    }

    /// Authenticate and decrypt a container from `reader` into `writer`
    pub fn decrypt_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        password: &Password,
    ) -> Result<(), DomainError> {
        let mut header_bytes = [0u8; HEADER_LEN];
        reader.read_exact(&mut header_bytes).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => {
                DomainError::ArchiveFailure("Not a splitvault container (too short)".to_string())
            }
            _ => DomainError::FsFail(format!("Read failed: {}", e)),
        })?;
        let header = ContainerHeader::from_bytes(&header_bytes)?;
        let key = header.kdf.derive_key(password, &header.salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| DomainError::ArchiveFailure(format!("Invalid key: {}", e)))?;

        let max_frame = header.chunk_size as usize + TAG_LEN;
        let mut ciphertext = vec![0u8; max_frame];
        let mut counter: u32 = 0;

        loop {
            let mut frame_header = [0u8; FRAME_HEADER_LEN];
            read_exact_or_truncated(&mut reader, &mut frame_header)?;
            let flag = frame_header[0];
            if flag != FLAG_MORE && flag != FLAG_FINAL {
                return Err(DomainError::ArchiveFailure(format!(
                    "Corrupted container: unknown frame flag {}",
                    flag
                )));
            }
            let mut length = [0u8; 4];
            length.copy_from_slice(&frame_header[1..]);
            let length = u32::from_le_bytes(length) as usize;
            if !(TAG_LEN..=max_frame).contains(&length) {
                return Err(DomainError::ArchiveFailure(format!(
                    "Corrupted container: frame length {} out of range",
                    length
                )));
            }

            read_exact_or_truncated(&mut reader, &mut ciphertext[..length])?;
            let nonce = header.nonce(counter);
            let aad = frame_aad(&header_bytes, counter, flag);
            let plaintext = Zeroizing::new(
                cipher
                    .decrypt(
                        Nonce::from_slice(&nonce),
                        Payload {
                            msg: &ciphertext[..length],
                            aad: &aad,
                        },
                    )
                    .map_err(|_| {
                        DomainError::ArchiveFailure("Wrong password or corrupted container".to_string())
                    })?,
            );
            write_all(&mut writer, &plaintext)?;

            if flag == FLAG_FINAL {
                break;
            }
            counter = counter
                .checked_add(1)
                .ok_or_else(|| DomainError::ArchiveFailure("Corrupted container: too many frames".to_string()))?;
        }

        let mut trailing = [0u8; 1];
        if read_chunk(&mut reader, &mut trailing)? != 0 {
            return Err(DomainError::ArchiveFailure(
                "Corrupted container: data after the final frame".to_string(),
            ));
        }

        writer
            .flush()
            .map_err(|e| DomainError::FsFail(format!("Write failed: {}", e)))?;
        Ok(())
    }

    fn encrypt_path(
        &self,
        source: &Path,
        destination: &Path,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError> {
        let input = File::open(source)
            .map_err(|e| DomainError::FsFail(format!("Failed to open {}: {}", source.display(), e)))?;
        let scratch = scratch_file_for(destination, ENCRYPTED_SUFFIX)?;
        self.encrypt_stream(
            BufReader::with_capacity(buffer_size, input),
            BufWriter::new(scratch.as_file()),
            password,
            buffer_size,
        )?;
        persist_scratch(scratch, destination)
    }

    fn decrypt_path(
        &self,
        source: &Path,
        destination: &Path,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError> {
        let input = File::open(source)
            .map_err(|e| DomainError::FsFail(format!("Failed to open {}: {}", source.display(), e)))?;
        let extension = destination
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let scratch = scratch_file_for(destination, &extension)?;
        self.decrypt_stream(
            BufReader::with_capacity(buffer_size, input),
            BufWriter::with_capacity(buffer_size, scratch.as_file()),
            password,
        )?;
        persist_scratch(scratch, destination)
    }
}

type FileJob = fn(&AesGcmCipher, &Path, &Path, &Password, usize) -> Result<(), DomainError>;

impl AesGcmCipher {
    /// Run a blocking file job off the async runtime
    async fn run_blocking(
        &self,
        job: FileJob,
        source: &Path,
        destination: &Path,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError> {
        let cipher = *self;
        let source: PathBuf = source.to_path_buf();
        let destination: PathBuf = destination.to_path_buf();
        let password = password.clone();

        tokio::task::spawn_blocking(move || job(&cipher, &source, &destination, &password, buffer_size))
            .await
            .map_err(|e| DomainError::ArchiveFailure(format!("Cipher task failed: {}", e)))?
    }
}

#[async_trait]
impl CipherPort for AesGcmCipher {
    async fn encrypt_file(
        &self,
        source: &Path,
        destination: &Path,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError> {
        self.run_blocking(Self::encrypt_path, source, destination, password, buffer_size)
            .await
    }

    async fn decrypt_file(
        &self,
        source: &Path,
        destination: &Path,
        password: &Password,
        buffer_size: usize,
    ) -> Result<(), DomainError> {
        self.run_blocking(Self::decrypt_path, source, destination, password, buffer_size)
            .await
    }
}
