//! Asset archive format constants, definitions, and low-level encoding.
//!
//! # Layout
//!
//! All integers are little-endian. Structures keep natural C field alignment,
//! so they contain reserved bytes that are written as zero and ignored
//! on read.
//!
//! ```text
//! offset 0                      archive header (24 bytes)
//! offset 24                     index region, reserved up to data_offset:
//!                                 file_count name entries (264 bytes each)
//!                                 file_count id entries   (264 bytes each)
//!                                 unused reserved slots
//! offset data_offset            records, contiguous:
//!                                 record header (296 bytes)
//!                                 data_size payload bytes
//! ```
//!
//! | Structure | Field | Offset | Size |
//! |-----------|-------|--------|------|
//! | Archive header | magic `"ASET"` | 0 | 4 |
//! | | version | 4 | 4 |
//! | | file_count | 8 | 4 |
//! | | reserved | 12 | 4 |
//! | | data_offset | 16 | 8 |
//! | Index entry | key (NUL-terminated name or decimal id) | 0 | 256 |
//! | | offset | 256 | 8 |
//! | Record header | magic `"FILE"` | 0 | 4 |
//! | | reserved | 4 | 4 |
//! | | id | 8 | 8 |
//! | | data_size | 16 | 8 |
//! | | filename (NUL-terminated) | 24 | 256 |
//! | | flags | 280 | 1 |
//! | | reserved | 281 | 3 |
//! | | checksum (CRC-32 of plaintext) | 284 | 4 |
//! | | padding | 288 | 8 |

pub mod header;
pub mod index;
pub mod reader;
pub mod record;

/// Magic bytes at the start of every archive.
pub const ARCHIVE_MAGIC: &[u8; 4] = b"ASET";

/// Magic bytes at the start of every record header.
pub const RECORD_MAGIC: &[u8; 4] = b"FILE";

/// Format version written by this crate.
///
/// Archives with a higher version are rejected.
pub const FORMAT_VERSION: u32 = 4;

/// Size of the archive header in bytes.
pub const ARCHIVE_HEADER_SIZE: u64 = 24;

/// Size of a record header in bytes.
pub const RECORD_HEADER_SIZE: u64 = 296;

/// Size of a single index entry in bytes.
pub const INDEX_ENTRY_SIZE: u64 = 264;

/// Size of the fixed name field (usable bytes plus terminator).
pub const NAME_FIELD_SIZE: usize = 256;

/// Size of the fixed key field of an index entry.
pub const KEY_FIELD_SIZE: usize = 256;

/// Returns the index region size needed for `records` entries in both tables.
#[inline]
pub const fn index_region_size(records: u64) -> u64 {
    records * INDEX_ENTRY_SIZE * 2
}
