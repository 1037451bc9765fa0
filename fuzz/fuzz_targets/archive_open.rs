//! Fuzz target for opening arbitrary bytes as an archive.
//!
//! This target exercises header and index parsing, then record header
//! reads and payload verification, with potentially malformed input. The
//! goal is to find panics, hangs, or unbounded allocations.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use assetpack::{Archive, ArchiveOptions, MemoryStorage, Mode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let options = ArchiveOptions::new().mode(Mode::Read).key("fuzz");
    let storage = MemoryStorage::from_vec(data.to_vec());

    // We don't care about the result - we're looking for panics or hangs
    if let Ok(mut archive) = Archive::open_stream_with(storage, options) {
        let _ = archive.list();
        let _ = archive.scan();
        let _ = archive.validate();
    }

    // Write mode falls back to a fresh archive on unparsable input.
    let storage = MemoryStorage::from_vec(data.to_vec());
    if let Ok(mut archive) = Archive::open_stream(storage) {
        let _ = archive.add_bytes("fuzz.bin", data);
        let _ = archive.compact();
    }
});
