//! Archive header structure and parsing.

use std::io::{Read, Write};

use super::reader::{le_u32, le_u64, put_u32, put_u64, read_block};
use super::{ARCHIVE_HEADER_SIZE, ARCHIVE_MAGIC, FORMAT_VERSION};
use crate::{Error, Result};

/// The fixed header at offset 0 of every archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Format version.
    pub version: u32,
    /// Number of active records (entries in each index table).
    pub file_count: u32,
    /// Absolute offset of the first record; the index region ends here.
    pub data_offset: u64,
}

impl Default for ArchiveHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveHeader {
    /// Creates the header of a fresh, empty archive.
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            file_count: 0,
            data_offset: ARCHIVE_HEADER_SIZE,
        }
    }

    /// Parses an archive header from a reader positioned at offset 0.
    ///
    /// # Errors
    ///
    /// - [`Error::CorruptHeader`] if fewer than 24 bytes are available or
    ///   `data_offset` points inside the header
    /// - [`Error::InvalidFormat`] if the magic is wrong or the version is
    ///   newer than [`FORMAT_VERSION`]
    pub fn parse<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        let buf: [u8; ARCHIVE_HEADER_SIZE as usize] = read_block(r, 0, "archive header")?;
        Self::decode(&buf)
    }

    /// Decodes a header from its on-disk bytes.
    pub fn decode(buf: &[u8; ARCHIVE_HEADER_SIZE as usize]) -> Result<Self> {
        if &buf[0..4] != ARCHIVE_MAGIC {
            return Err(Error::InvalidFormat(format!(
                "bad archive magic {:02X?}",
                &buf[0..4]
            )));
        }

        let version = le_u32(buf, 4);
        if version > FORMAT_VERSION {
            return Err(Error::InvalidFormat(format!(
                "unsupported format version {} (newest supported is {})",
                version, FORMAT_VERSION
            )));
        }

        let header = Self {
            version,
            file_count: le_u32(buf, 8),
            data_offset: le_u64(buf, 16),
        };

        if header.data_offset < ARCHIVE_HEADER_SIZE {
            return Err(Error::corrupt_header(
                16,
                format!("data offset {} points inside the header", header.data_offset),
            ));
        }

        Ok(header)
    }

    /// Encodes the header into its on-disk bytes.
    pub fn to_bytes(&self) -> [u8; ARCHIVE_HEADER_SIZE as usize] {
        let mut buf = [0u8; ARCHIVE_HEADER_SIZE as usize];
        buf[0..4].copy_from_slice(ARCHIVE_MAGIC);
        put_u32(&mut buf, 4, self.version);
        put_u32(&mut buf, 8, self.file_count);
        put_u64(&mut buf, 16, self.data_offset);
        buf
    }

    /// Writes the header at the writer's current position.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Returns the size of the reserved index region in bytes.
    #[inline]
    pub fn reserved_index_bytes(&self) -> u64 {
        self.data_offset - ARCHIVE_HEADER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_fresh_header() {
        let header = ArchiveHeader::new();
        assert_eq!(header.version, 4);
        assert_eq!(header.file_count, 0);
        assert_eq!(header.data_offset, ARCHIVE_HEADER_SIZE);
        assert_eq!(header.reserved_index_bytes(), 0);
    }

    #[test]
    fn test_encode_layout() {
        let header = ArchiveHeader {
            version: 4,
            file_count: 3,
            data_offset: 24 + 6 * 264,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"ASET");
        assert_eq!(&bytes[4..8], &4u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &3u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
        assert_eq!(&bytes[16..24], &(24u64 + 6 * 264).to_le_bytes());

        let parsed = ArchiveHeader::parse(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = ArchiveHeader::new().to_bytes();
        bytes[0] = b'Z';
        let err = ArchiveHeader::decode(&bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut header = ArchiveHeader::new();
        header.version = FORMAT_VERSION + 1;
        let err = ArchiveHeader::decode(&header.to_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = ArchiveHeader::new().to_bytes();
        let err = ArchiveHeader::parse(&mut Cursor::new(&bytes[..10])).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 0, .. }));
    }

    #[test]
    fn test_data_offset_inside_header() {
        let mut header = ArchiveHeader::new();
        header.data_offset = 8;
        let err = ArchiveHeader::decode(&header.to_bytes()).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 16, .. }));
    }
}
