//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assetpack::{Archive, ArchiveOptions, EntryInfo, MemoryStorage};

/// Opens an empty in-memory archive in write mode.
pub fn memory_archive() -> Archive<MemoryStorage> {
    Archive::open_stream(MemoryStorage::new()).expect("open empty archive")
}

/// Opens an empty in-memory archive with the given options.
pub fn memory_archive_with(options: ArchiveOptions) -> Archive<MemoryStorage> {
    Archive::open_stream_with(MemoryStorage::new(), options).expect("open empty archive")
}

/// Creates an in-memory archive holding `entries` as `(name, data)` pairs.
///
/// Returns the archive and the stored entries, in insertion order. The
/// entries are re-read after the last add, so offsets reflect any rebuild.
pub fn archive_with(entries: &[(&str, &[u8])]) -> (Archive<MemoryStorage>, Vec<EntryInfo>) {
    let mut archive = memory_archive();
    let ids: Vec<u64> = entries
        .iter()
        .map(|(name, data)| archive.add_bytes(name, data).expect("add entry").id)
        .collect();
    let infos = ids
        .into_iter()
        .map(|id| archive.entry(id).expect("stored entry"))
        .collect();
    (archive, infos)
}

/// Closes `archive` and returns its raw bytes.
pub fn into_bytes(archive: Archive<MemoryStorage>) -> Vec<u8> {
    archive.close().expect("close archive").into_inner()
}

/// Reopens raw archive bytes in write mode.
pub fn reopen(bytes: Vec<u8>) -> Archive<MemoryStorage> {
    Archive::open_stream(MemoryStorage::from_vec(bytes)).expect("reopen archive")
}

/// Writes `data` to `dir/name` and returns the path.
pub fn write_source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write source file");
    path
}

/// Generates `len` bytes of deterministic, non-repeating content.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) ^ (i >> 8) as u8)
        .collect()
}
