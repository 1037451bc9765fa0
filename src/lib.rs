//! # assetpack
//!
//! A single-file asset archive: many named blobs packed into one seekable
//! file with an in-file index, soft delete, compaction, CRC-32 integrity
//! checks and optional XOR payload encryption.
//!
//! Every record is reachable by two keys, its display name and a 64-bit
//! numeric id. Both are kept in index tables at the front of the file,
//! and every mutation leaves the header, the index and the records
//! consistent before it returns.
//!
//! ## Quick Start
//!
//! ### Creating and Reading an Archive
//!
//! ```rust,no_run
//! use assetpack::{Archive, ArchiveOptions, Mode, Result};
//!
//! fn main() -> Result<()> {
//!     let (mut archive, created) = Archive::create(
//!         "assets.pack",
//!         &["logo.png", "theme.ogg"],
//!         ArchiveOptions::new(),
//!     )?;
//!     for (source, reason) in &created.failures {
//!         eprintln!("skipped {}: {}", source, reason);
//!     }
//!
//!     archive.add_file("level1.map")?;
//!     drop(archive);
//!
//!     let mut archive = Archive::open("assets.pack", Mode::Read)?;
//!     for entry in archive.list()? {
//!         println!("{} (id {}, {} bytes)", entry.name, entry.id, entry.size);
//!     }
//!     let logo = archive.read_by_name("logo.png")?;
//!     println!("logo is {} bytes", logo.len());
//!     Ok(())
//! }
//! ```
//!
//! ### Editing
//!
//! ```rust
//! use assetpack::{Archive, MemoryStorage};
//!
//! let mut archive = Archive::open_stream(MemoryStorage::new()).unwrap();
//! archive.add_bytes("a.txt", b"first").unwrap();
//! archive.add_bytes("b.txt", b"second").unwrap();
//!
//! archive.rename_by_name("a.txt", "renamed.txt").unwrap();
//! archive.remove_by_name("b.txt").unwrap();
//!
//! // Removed records stay on disk until compaction.
//! let result = archive.compact().unwrap();
//! assert_eq!(result.deleted_dropped, 1);
//! assert_eq!(archive.len(), 1);
//! ```
//!
//! ### Encryption
//!
//! ```rust
//! use assetpack::{Archive, ArchiveOptions, Error, MemoryStorage};
//!
//! let options = ArchiveOptions::new().encryption(true).key("s3cret");
//! let mut archive = Archive::open_stream_with(MemoryStorage::new(), options).unwrap();
//! let entry = archive.add_bytes("secret.txt", b"hidden").unwrap();
//! assert_eq!(archive.read(entry.id).unwrap(), b"hidden");
//!
//! archive.clear_key();
//! assert!(matches!(archive.read(entry.id), Err(Error::KeyRequired { .. })));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Builds the `assetpack` command-line tool |
//!
//! ## Logging
//!
//! The library logs through the [`log`] facade: structural events such as
//! rebuilds and compactions at debug level, skipped or unverifiable records
//! at warn level. Install any `log` backend to see them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Default number of bytes copied per payload chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

pub mod archive;
pub mod checksum;
pub mod crypto;
pub mod error;
pub mod format;
pub mod name;
pub mod options;
pub mod storage;

pub use archive::{
    AddResult, Archive, CompactResult, CreateResult, EntryInfo, ExtractAllResult,
    RemoveAllResult, ValidateResult,
};
pub use crypto::EncryptionKey;
pub use error::{Error, Result};
pub use format::record::RecordFlags;
pub use name::EntryName;
pub use options::{ArchiveOptions, Mode};
pub use storage::{FileStorage, MemoryStorage, Storage};
