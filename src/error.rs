//! Error types for asset archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with asset archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Batch
//! operations ([`Archive::extract_all`], [`Archive::add_files`],
//! [`Archive::validate`]) do not fail on a single bad record; they collect
//! per-record failures in their result structs instead.
//!
//! ```rust,no_run
//! use assetpack::{Archive, Error, Mode};
//!
//! fn extract_one(path: &str, name: &str) -> assetpack::Result<Vec<u8>> {
//!     let mut archive = Archive::open(path, Mode::Read)?;
//!     match archive.read_by_name(name) {
//!         Ok(data) => Ok(data),
//!         Err(Error::EntryNotFound { key }) => {
//!             eprintln!("no such entry: {}", key);
//!             Err(Error::EntryNotFound { key })
//!         }
//!         Err(e) if e.is_corruption() => {
//!             eprintln!("record is damaged: {}", e);
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! [`Archive::extract_all`]: crate::Archive::extract_all
//! [`Archive::add_files`]: crate::Archive::add_files
//! [`Archive::validate`]: crate::Archive::validate

use std::io;

/// Helper struct for formatting integrity error messages.
struct IntegrityDisplay<'a> {
    what: &'a str,
    id: u64,
    name: Option<&'a str>,
    expected: u64,
    actual: u64,
    hex: bool,
}

impl std::fmt::Display for IntegrityDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} for record {}", self.what, self.id)?;
        if let Some(name) = self.name {
            write!(f, " ({})", name)?;
        }
        if self.hex {
            write!(f, ": expected {:#x}, got {:#x}", self.expected, self.actual)
        } else {
            write!(
                f,
                ": expected {} bytes, got {}",
                self.expected, self.actual
            )
        }
    }
}

/// The main error type for asset archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations, short writes |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader] | Bad magic, truncated header or index |
/// | Lookup | [`EntryNotFound`][Self::EntryNotFound], [`RecordDeleted`][Self::RecordDeleted] | Unknown id or name |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch], [`TruncatedRecord`][Self::TruncatedRecord] | Damaged payload bytes |
/// | Constraint | [`InvalidName`][Self::InvalidName], [`EntryExists`][Self::EntryExists], [`IndexFull`][Self::IndexFull] | Rejected before any write |
/// | State | [`ReadOnly`][Self::ReadOnly], [`KeyRequired`][Self::KeyRequired] | Wrong mode or missing key |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file or stream operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data is not an asset archive, or uses an unknown version.
    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    /// A header, index entry or record header is corrupt or truncated.
    ///
    /// The offset is the absolute byte position of the damaged structure.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// No active record is indexed under the given id or name.
    #[error("Entry not found: {key}")]
    EntryNotFound {
        /// The id (decimal) or display name that was looked up.
        key: String,
    },

    /// The index points at a record that is no longer active.
    #[error("Record {id} is marked as deleted")]
    RecordDeleted {
        /// Id of the deleted record.
        id: u64,
    },

    /// The checksum of the plaintext payload does not match the stored value.
    ///
    /// For encrypted records this is also how a wrong key shows up.
    #[error("{}", IntegrityDisplay { what: "CRC32 mismatch", id: *id, name: name.as_deref(), expected: u64::from(*expected), actual: u64::from(*actual), hex: true })]
    CrcMismatch {
        /// Id of the damaged record.
        id: u64,
        /// Display name of the damaged record (if known).
        name: Option<String>,
        /// The checksum stored in the record header.
        expected: u32,
        /// The checksum of the bytes actually read.
        actual: u32,
    },

    /// The payload ended before the size recorded in its header.
    #[error("{}", IntegrityDisplay { what: "Truncated payload", id: *id, name: name.as_deref(), expected: *expected, actual: *actual, hex: false })]
    TruncatedRecord {
        /// Id of the truncated record.
        id: u64,
        /// Display name of the truncated record (if known).
        name: Option<String>,
        /// Payload size stored in the record header.
        expected: u64,
        /// Number of bytes that could be read.
        actual: u64,
    },

    /// A display name was rejected.
    ///
    /// Names must be 1 to 255 bytes, contain no NUL byte, no path
    /// separator, and must not be `.` or `..`.
    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    /// Another active record already uses this display name.
    #[error("Entry already exists: {name}")]
    EntryExists {
        /// The conflicting display name.
        name: String,
    },

    /// The record count field cannot hold any more entries.
    #[error("Archive index is full")]
    IndexFull,

    /// A mutating operation was attempted on an archive opened for reading.
    #[error("Archive is opened read-only")]
    ReadOnly,

    /// An encryption key is needed but none is configured.
    ///
    /// `id` is the encrypted record being read, or `None` when the
    /// archive has encryption enabled for new records without a key.
    #[error("encryption key required{}", id.as_ref().map(|id| format!(" for record {}", id)).unwrap_or_default())]
    KeyRequired {
        /// The encrypted record, if the error came from a read.
        id: Option<u64>,
    },
}

impl Error {
    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors affect a single record or structure; batch
    /// operations skip the record and continue.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. } | Error::TruncatedRecord { .. } | Error::CorruptHeader { .. }
        )
    }

    /// Returns `true` if the id or name was not resolvable.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::EntryNotFound { .. } | Error::RecordDeleted { .. }
        )
    }

    /// Returns `true` if this is an encryption-related error.
    pub fn is_encryption_error(&self) -> bool {
        matches!(self, Error::KeyRequired { .. })
    }

    /// Returns the record id associated with this error, if any.
    pub fn record_id(&self) -> Option<u64> {
        match self {
            Error::RecordDeleted { id } => Some(*id),
            Error::CrcMismatch { id, .. } => Some(*id),
            Error::TruncatedRecord { id, .. } => Some(*id),
            Error::KeyRequired { id } => *id,
            _ => None,
        }
    }

    /// Creates a CrcMismatch error.
    pub fn crc_mismatch(id: u64, name: Option<String>, expected: u32, actual: u32) -> Self {
        Error::CrcMismatch {
            id,
            name,
            expected,
            actual,
        }
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates an EntryNotFound error for any displayable key.
    pub fn not_found(key: impl std::fmt::Display) -> Self {
        Error::EntryNotFound {
            key: key.to_string(),
        }
    }
}

/// A specialized Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
