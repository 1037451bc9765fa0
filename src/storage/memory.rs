//! In-memory storage.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use super::{Sink, Source, Storage};
use crate::Result;

/// Storage over a growable in-memory buffer.
///
/// Writes inside the buffer overwrite existing bytes; writes past the end
/// grow it, zero-filling any gap. A rewrite builds a fresh buffer and
/// swaps it in.
///
/// ```
/// use std::io::{Read, Seek, SeekFrom, Write};
/// use assetpack::MemoryStorage;
///
/// let mut storage = MemoryStorage::new();
/// storage.write_all(b"hello world").unwrap();
/// storage.seek(SeekFrom::Start(6)).unwrap();
/// storage.write_all(b"there").unwrap();
/// assert_eq!(storage.as_slice(), b"hello there");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    cursor: Cursor<Vec<u8>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage over existing bytes, positioned at the start.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Replaces the buffer, returning the previous one.
    pub fn attach(&mut self, data: Vec<u8>) -> Vec<u8> {
        std::mem::replace(&mut self.cursor, Cursor::new(data)).into_inner()
    }

    /// Takes the buffer, leaving the storage empty.
    pub fn detach(&mut self) -> Vec<u8> {
        self.attach(Vec::new())
    }

    /// Consumes the storage and returns its bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }

    /// Returns the stored bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    /// Returns the stored bytes for in-place modification.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.cursor.get_mut()
    }

    /// Returns the number of stored bytes.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Returns `true` if no bytes are stored.
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Returns the current position.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Moves the position back to the start.
    pub fn reset_position(&mut self) {
        self.cursor.set_position(0);
    }

    /// Truncates or zero-extends the buffer to `len` bytes.
    pub fn set_len(&mut self, len: usize) {
        self.cursor.get_mut().resize(len, 0);
    }
}

impl From<Vec<u8>> for MemoryStorage {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl Read for MemoryStorage {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Write for MemoryStorage {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryStorage {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Storage for MemoryStorage {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn rewrite<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Source, &mut dyn Sink) -> Result<T>,
    {
        self.cursor.rewrite(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_past_end_zero_fills() {
        let mut storage = MemoryStorage::new();
        storage.seek(SeekFrom::Start(4)).unwrap();
        storage.write_all(b"ab").unwrap();
        assert_eq!(storage.as_slice(), &[0, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_attach_detach() {
        let mut storage = MemoryStorage::from_vec(b"first".to_vec());
        storage.seek(SeekFrom::End(0)).unwrap();
        let previous = storage.attach(b"second".to_vec());
        assert_eq!(previous, b"first");
        assert_eq!(storage.position(), 0);
        assert_eq!(storage.detach(), b"second");
        assert!(storage.is_empty());
    }

    #[test]
    fn test_set_len() {
        let mut storage = MemoryStorage::from_vec(vec![1, 2, 3, 4]);
        storage.set_len(2);
        assert_eq!(storage.as_slice(), &[1, 2]);
        storage.set_len(3);
        assert_eq!(storage.as_slice(), &[1, 2, 0]);
    }

    #[test]
    fn test_read_at_end_returns_zero() {
        let mut storage = MemoryStorage::from_vec(vec![7; 3]);
        storage.seek(SeekFrom::End(0)).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(storage.read(&mut buf).unwrap(), 0);
        storage.reset_position();
        assert_eq!(storage.read(&mut buf).unwrap(), 3);
    }

    #[test]
    fn test_rewrite_swaps_buffer() {
        let mut storage = MemoryStorage::from_vec(b"0123456789".to_vec());
        storage
            .rewrite(|old, new| {
                old.seek(SeekFrom::Start(5))?;
                let mut tail = Vec::new();
                old.read_to_end(&mut tail)?;
                new.write_all(&tail)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(storage.as_slice(), b"56789");
        assert_eq!(storage.position(), 0);
    }
}
