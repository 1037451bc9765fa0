//! Encryption tests: XOR payloads, key handling, and how missing or wrong
//! keys surface.

mod common;

use assetpack::{Archive, ArchiveOptions, EncryptionKey, Error, MemoryStorage, Mode};
use tempfile::TempDir;

use common::{into_bytes, memory_archive_with, pattern, reopen, write_source};

fn encrypted() -> ArchiveOptions {
    ArchiveOptions::new().encryption(true).key("correct horse")
}

#[test]
fn test_encrypted_round_trip() {
    let data = pattern(20_000, 5);
    let mut archive = memory_archive_with(encrypted().chunk_size(100));
    let entry = archive.add_bytes("secret.bin", &data).unwrap();
    assert!(entry.is_encrypted());
    assert_eq!(archive.read(entry.id).unwrap(), data);

    let bytes = into_bytes(archive);
    let options = ArchiveOptions::new().mode(Mode::Read).key("correct horse");
    let mut archive = Archive::open_stream_with(MemoryStorage::from_vec(bytes), options).unwrap();
    assert_eq!(archive.read(entry.id).unwrap(), data);
}

#[test]
fn test_stored_bytes_differ_from_plaintext() {
    let data = b"plainly visible text".to_vec();
    let mut archive = memory_archive_with(encrypted());
    let entry = archive.add_bytes("s", &data).unwrap();
    let entry = archive.entry(entry.id).unwrap();

    let raw = archive.storage().as_slice();
    let start = (entry.offset + 296) as usize;
    assert_ne!(&raw[start..start + data.len()], data.as_slice());
}

#[test]
fn test_keystream_is_independent_of_chunk_size() {
    let data = pattern(1000, 11);
    let mut small = memory_archive_with(encrypted().chunk_size(3));
    let mut large = memory_archive_with(encrypted().chunk_size(4096));
    let a = small.add_bytes("x", &data).unwrap();
    let b = large.add_bytes("x", &data).unwrap();
    let a = small.entry(a.id).unwrap();
    let b = large.entry(b.id).unwrap();

    let slice = |archive: &Archive<MemoryStorage>, offset: u64| {
        let start = (offset + 296) as usize;
        archive.storage().as_slice()[start..start + data.len()].to_vec()
    };
    assert_eq!(slice(&small, a.offset), slice(&large, b.offset));

    // Cross-read: written with 3-byte chunks, read with 4096-byte chunks.
    let bytes = into_bytes(small);
    let mut reader =
        Archive::open_stream_with(MemoryStorage::from_vec(bytes), encrypted().chunk_size(4096))
            .unwrap();
    assert_eq!(reader.read(a.id).unwrap(), data);
}

#[test]
fn test_missing_key_is_reported() {
    let mut archive = memory_archive_with(encrypted());
    let entry = archive.add_bytes("s", b"secret").unwrap();
    let mut archive = reopen(into_bytes(archive));

    let err = archive.read(entry.id).unwrap_err();
    assert!(err.is_encryption_error());
    assert!(matches!(err, Error::KeyRequired { id: Some(id) } if id == entry.id));
}

#[test]
fn test_wrong_key_fails_checksum() {
    let mut archive = memory_archive_with(encrypted());
    let entry = archive.add_bytes("s", b"secret message").unwrap();
    let bytes = into_bytes(archive);

    let options = ArchiveOptions::new().key("wrong key");
    let mut archive = Archive::open_stream_with(MemoryStorage::from_vec(bytes), options).unwrap();
    assert!(matches!(
        archive.read(entry.id),
        Err(Error::CrcMismatch { .. })
    ));
}

#[test]
fn test_encryption_without_key_refuses_to_write() {
    let mut archive = memory_archive_with(ArchiveOptions::new().encryption(true));
    let err = archive.add_bytes("s", b"secret").unwrap_err();
    assert!(matches!(err, Error::KeyRequired { id: None }));
    assert!(archive.is_empty());
    assert!(archive.storage().is_empty());
}

#[test]
fn test_empty_key_is_rejected() {
    assert!(EncryptionKey::new("").is_err());
    let mut archive = memory_archive_with(ArchiveOptions::new());
    assert!(archive.set_key("").is_err());
}

#[test]
fn test_mixed_plain_and_encrypted_records() {
    let mut archive = memory_archive_with(ArchiveOptions::new().key("k"));
    let plain = archive.add_bytes("plain", b"visible").unwrap();
    archive.set_encryption(true);
    let secret = archive.add_bytes("secret", b"hidden").unwrap();
    archive.set_encryption(false);

    assert!(!plain.is_encrypted());
    assert!(secret.is_encrypted());
    assert_eq!(archive.read(plain.id).unwrap(), b"visible");
    assert_eq!(archive.read(secret.id).unwrap(), b"hidden");

    archive.clear_key();
    assert_eq!(archive.read(plain.id).unwrap(), b"visible");
    let report = archive.validate().unwrap();
    assert_eq!(report.passed, ["plain"]);
    assert_eq!(report.failures[0].0, "secret");
}

#[test]
fn test_compact_with_key_verifies_ciphertext() {
    let mut archive = memory_archive_with(encrypted());
    let keep = archive.add_bytes("keep", b"encrypted keep").unwrap();
    let gone = archive.add_bytes("drop", b"encrypted drop").unwrap();
    archive.remove(gone.id).unwrap();

    let result = archive.compact().unwrap();
    assert_eq!(result.kept, 1);
    assert_eq!(result.unverified, 0);
    assert_eq!(archive.read(keep.id).unwrap(), b"encrypted keep");
}

#[test]
fn test_compact_without_key_keeps_unverified() {
    let mut archive = memory_archive_with(encrypted());
    let entry = archive.add_bytes("s", b"secret").unwrap();
    archive.clear_key();

    let result = archive.compact().unwrap();
    assert_eq!(result.kept, 1);
    assert_eq!(result.unverified, 1);

    archive.set_key("correct horse").unwrap();
    assert_eq!(archive.read(entry.id).unwrap(), b"secret");
}

#[test]
fn test_extract_all_decrypts() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "secret.txt", b"top secret");
    let path = dir.path().join("game.asset");
    let (archive, _) = Archive::create(&path, &[source], encrypted()).unwrap();
    drop(archive);

    let options = ArchiveOptions::new().mode(Mode::Read).key("correct horse");
    let mut archive = Archive::open_with(&path, options).unwrap();
    let out = dir.path().join("out");
    let result = archive.extract_all(&out).unwrap();
    assert!(result.is_complete());
    assert_eq!(std::fs::read(out.join("secret.txt")).unwrap(), b"top secret");
}

#[test]
fn test_key_debug_hides_bytes() {
    let key = EncryptionKey::new("hunter2").unwrap();
    let shown = format!("{:?}", key);
    assert!(!shown.contains("hunter2"));
}
