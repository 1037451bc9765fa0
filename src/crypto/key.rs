//! Encryption key storage.

use zeroize::Zeroizing;

use crate::{Error, Result};

/// A repeating XOR key for payload encryption.
///
/// The key bytes live in zeroized memory and are never shown by `Debug`.
#[derive(Clone)]
pub struct EncryptionKey {
    inner: Zeroizing<Vec<u8>>,
}

impl EncryptionKey {
    /// Creates a key from raw bytes or a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyRequired`] if the key is empty.
    pub fn new<K: AsRef<[u8]>>(key: K) -> Result<Self> {
        let bytes = key.as_ref();
        if bytes.is_empty() {
            return Err(Error::KeyRequired { id: None });
        }
        Ok(Self {
            inner: Zeroizing::new(bytes.to_vec()),
        })
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Returns the key length in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always `false`; empty keys are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose the key in debug output
        f.debug_struct("EncryptionKey")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl TryFrom<&str> for EncryptionKey {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for EncryptionKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        let s = Zeroizing::new(s);
        Self::new(s.as_bytes())
    }
}
