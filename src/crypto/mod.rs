//! Payload encryption.
//!
//! Encrypted records store their payload XORed against a repeating key.
//! Record headers are never encrypted, and the stored checksum is always
//! taken over the plaintext.
//!
//! The cipher is chosen per call: every payload read or write takes a
//! [`Cipher`] argument, and the keystream restarts at position 0 for each
//! payload.
//!
//! This is obfuscation, not authenticated encryption. A wrong key is only
//! detected through the plaintext checksum.

mod key;
mod xor;

pub use key::EncryptionKey;
pub use xor::XorCipher;

/// Selects how payload bytes are transformed on their way to or from storage.
#[derive(Debug, Clone, Copy, Default)]
pub enum Cipher<'a> {
    /// Bytes are stored as-is.
    #[default]
    Plain,
    /// Bytes are XORed with the given key.
    Xor(&'a EncryptionKey),
}

impl<'a> Cipher<'a> {
    /// Selects [`Cipher::Xor`] when `encrypted` is set and a key is given.
    ///
    /// Returns `None` if the payload is encrypted but there is no key.
    pub fn for_record(encrypted: bool, key: Option<&'a EncryptionKey>) -> Option<Self> {
        match (encrypted, key) {
            (false, _) => Some(Cipher::Plain),
            (true, Some(key)) => Some(Cipher::Xor(key)),
            (true, None) => None,
        }
    }

    /// Starts a keystream for one payload.
    pub fn begin(self) -> Keystream<'a> {
        match self {
            Cipher::Plain => Keystream(None),
            Cipher::Xor(key) => Keystream(Some(XorCipher::new(key))),
        }
    }

    /// Returns `true` for the XOR cipher.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Cipher::Xor(_))
    }
}

/// Running transform state for one payload.
#[derive(Debug)]
pub struct Keystream<'a>(Option<XorCipher<'a>>);

impl Keystream<'_> {
    /// Transforms the next chunk of the payload in place.
    #[inline]
    pub fn apply(&mut self, chunk: &mut [u8]) {
        if let Some(xor) = &mut self.0 {
            xor.apply(chunk);
        }
    }
}
