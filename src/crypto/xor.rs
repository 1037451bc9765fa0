//! Repeating-key XOR cipher.

use super::EncryptionKey;

/// XOR keystream over a repeating key.
///
/// The position advances with every byte processed, so a payload split
/// into chunks of any size produces the same output as one whole call.
#[derive(Debug, Clone)]
pub struct XorCipher<'a> {
    key: &'a [u8],
    pos: usize,
}

impl<'a> XorCipher<'a> {
    /// Starts a keystream at position 0.
    pub fn new(key: &'a EncryptionKey) -> Self {
        Self {
            key: key.as_bytes(),
            pos: 0,
        }
    }

    /// XORs `buf` in place. Encryption and decryption are the same operation.
    pub fn apply(&mut self, buf: &mut [u8]) {
        let len = self.key.len();
        for byte in buf.iter_mut() {
            *byte ^= self.key[self.pos];
            self.pos += 1;
            if self.pos == len {
                self.pos = 0;
            }
        }
    }

    /// Number of bytes processed, modulo the key length.
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_output() {
        let key = EncryptionKey::new([0x01u8, 0x02]).unwrap();
        let mut data = [0x00, 0x00, 0x00, 0xFF];
        XorCipher::new(&key).apply(&mut data);
        assert_eq!(data, [0x01, 0x02, 0x01, 0xFD]);
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let key = EncryptionKey::new("0123456").unwrap();
        let plain: Vec<u8> = (0..100u8).collect();

        let mut whole = plain.clone();
        XorCipher::new(&key).apply(&mut whole);

        let mut chunked = plain.clone();
        let mut cipher = XorCipher::new(&key);
        for chunk in chunked.chunks_mut(3) {
            cipher.apply(chunk);
        }
        assert_eq!(whole, chunked);
        assert_eq!(cipher.position(), 100 % 7);
    }
}
