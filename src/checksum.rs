//! Checksum computation utilities.
//!
//! Every record stores the CRC-32 (IEEE 802.3 polynomial, the same one used
//! by ZIP and Ethernet) of its *plaintext* payload. The value is computed
//! before encryption on write and after decryption on read.
//!
//! # Example
//!
//! ```rust
//! use assetpack::checksum::{Checksum, Crc32};
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), Crc32::compute(b"Hello, World!"));
//! ```

/// Common trait for checksum computation.
pub trait Checksum: Default + Clone {
    /// The output type of this checksum.
    type Output: Copy + Eq + std::fmt::Debug;

    /// Creates a new checksum calculator.
    fn new() -> Self;

    /// Updates the checksum with additional data.
    fn update(&mut self, data: &[u8]);

    /// Finishes the checksum computation and returns the value.
    fn finalize(&self) -> Self::Output;

    /// Computes the checksum of a single slice in one call.
    fn compute(data: &[u8]) -> Self::Output {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// CRC-32 checksum calculator.
///
/// ```rust
/// use assetpack::checksum::{Checksum, Crc32};
///
/// assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
/// ```
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Checksum for Crc32 {
    type Output = u32;

    fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

/// Computes the CRC-32 of `data` in one call.
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    Crc32::compute(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(crc32(b"Hello, World!"), 0xEC4AC3D0);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_crc32_incremental_matches_one_shot() {
        let mut crc = Crc32::new();
        crc.update(b"ab");
        crc.update(b"");
        crc.update(b"cd");
        assert_eq!(crc.finalize(), Crc32::compute(b"abcd"));
    }

    #[test]
    fn test_single_byte_flip_changes_crc() {
        let mut data = b"some asset payload".to_vec();
        let before = crc32(&data);
        data[3] ^= 0x01;
        assert_ne!(before, crc32(&data));
    }
}
