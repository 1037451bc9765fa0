//! Archive open mode and configuration.

use crate::DEFAULT_CHUNK_SIZE;
use crate::crypto::EncryptionKey;

/// How an archive is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Read-only. Opening fails unless the header and index parse.
    Read,
    /// Read and write. A missing or unparsable archive starts out empty.
    #[default]
    Write,
}

impl Mode {
    /// Returns `true` for [`Mode::Write`].
    pub fn is_write(self) -> bool {
        matches!(self, Mode::Write)
    }
}

/// Options for opening and modifying an archive.
///
/// # Example
///
/// ```rust
/// use assetpack::{ArchiveOptions, Mode};
///
/// let options = ArchiveOptions::new()
///     .mode(Mode::Write)
///     .encryption(true)
///     .key("correct horse")
///     .index_reserve(64);
/// assert!(options.is_encryption_enabled());
/// assert!(options.has_key());
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Open mode.
    pub mode: Mode,
    /// Write new payloads encrypted.
    pub encryption: bool,
    /// Key for encrypting new payloads and decrypting stored ones.
    pub key: Option<EncryptionKey>,
    /// Maximum number of bytes copied per payload chunk.
    pub chunk_size: usize,
    /// Extra record slots reserved whenever the index region is sized.
    pub index_reserve: u32,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Write,
            encryption: false,
            key: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            index_reserve: 0,
        }
    }
}

impl ArchiveOptions {
    /// Creates default options: write mode, no encryption, 8 KiB chunks,
    /// no spare index slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the open mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables or disables encryption of new payloads.
    ///
    /// A key must also be set before adding records while encryption is on.
    pub fn encryption(mut self, enabled: bool) -> Self {
        self.encryption = enabled;
        self
    }

    /// Sets the encryption key from raw bytes or a string.
    ///
    /// An empty key clears any configured key.
    pub fn key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.key = EncryptionKey::new(key).ok();
        self
    }

    /// Sets an already constructed encryption key.
    pub fn encryption_key(mut self, key: EncryptionKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Sets the payload chunk size. Values below 1 are raised to 1.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Sets the number of spare record slots kept in the index region.
    pub fn index_reserve(mut self, slots: u32) -> Self {
        self.index_reserve = slots;
        self
    }

    /// Returns `true` if new payloads are written encrypted.
    pub fn is_encryption_enabled(&self) -> bool {
        self.encryption
    }

    /// Returns `true` if a key is configured.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }
}
