//! CLI command integration tests.
//!
//! These tests verify the core functionality that CLI commands would use.
//! Tests use library functions directly rather than subprocess execution.

use std::path::PathBuf;
use tempfile::TempDir;

use assetpack::{Archive, ArchiveOptions, Error, Mode};

mod common;

use common::write_source;

/// Creates a test archive file on disk from `(name, data)` sources.
fn create_test_archive_file(entries: &[(&str, &[u8])]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sources: Vec<PathBuf> = entries
        .iter()
        .map(|(name, data)| write_source(temp_dir.path(), name, data))
        .collect();
    let archive_path = temp_dir.path().join("test.asset");
    let (_, created) = Archive::create(&archive_path, &sources, ArchiveOptions::new())
        .expect("Failed to create archive");
    assert!(created.is_complete());
    (temp_dir, archive_path)
}

// =============================================================================
// Create / Add Command Tests
// =============================================================================

#[test]
fn test_create_empty_archive() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("empty.asset");
    let no_sources: &[PathBuf] = &[];

    let (archive, created) =
        Archive::create(&archive_path, no_sources, ArchiveOptions::new()).unwrap();
    assert!(created.added.is_empty());
    assert!(archive.is_empty());
    drop(archive);

    assert_eq!(std::fs::metadata(&archive_path).unwrap().len(), 24);
    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    assert!(archive.list().unwrap().is_empty());
    assert!(archive.validate().unwrap().is_valid());
}

#[test]
fn test_add_to_existing_archive() {
    let (temp_dir, archive_path) = create_test_archive_file(&[("a.txt", b"a")]);
    let extra = write_source(temp_dir.path(), "b.txt", b"b");

    let mut archive = Archive::open(&archive_path, Mode::Write).unwrap();
    let result = archive.add_files(&[extra]).unwrap();
    assert_eq!(result.added[0].name.as_str(), "b.txt");
    drop(archive);

    let archive = Archive::open(&archive_path, Mode::Read).unwrap();
    assert_eq!(archive.len(), 2);
}

#[test]
fn test_add_creates_missing_archive() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("new.asset");
    let source = write_source(temp_dir.path(), "a.txt", b"a");

    let mut archive = Archive::open(&archive_path, Mode::Write).unwrap();
    archive.add_file(&source).unwrap();
    drop(archive);
    assert!(archive_path.exists());
}

#[test]
fn test_add_same_file_twice_gets_suffix() {
    let (temp_dir, archive_path) = create_test_archive_file(&[("logo.png", b"png")]);
    let again = temp_dir.path().join("logo.png");

    let mut archive = Archive::open(&archive_path, Mode::Write).unwrap();
    let entry = archive.add_file(&again).unwrap();
    assert_eq!(entry.name.as_str(), "logo(1).png");
}

// =============================================================================
// List / Validate Command Tests
// =============================================================================

#[test]
fn test_list_nonexistent_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = Archive::open(temp_dir.path().join("missing.asset"), Mode::Read);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_list_all_includes_deleted() {
    let (_temp_dir, archive_path) =
        create_test_archive_file(&[("a.txt", b"a"), ("b.txt", b"b")]);
    let mut archive = Archive::open(&archive_path, Mode::Write).unwrap();
    archive.remove_by_name("a.txt").unwrap();
    drop(archive);

    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    assert_eq!(archive.list().unwrap().len(), 1);
    let all = archive.scan().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().filter(|e| e.is_deleted()).count(), 1);
}

#[test]
fn test_validate_valid_archive() {
    let (_temp_dir, archive_path) =
        create_test_archive_file(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);
    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    let report = archive.validate().unwrap();
    assert!(report.is_valid());
    assert_eq!(report.checked(), 2);
}

// =============================================================================
// Extract Command Tests
// =============================================================================

#[test]
fn test_extract_by_name() {
    let (temp_dir, archive_path) = create_test_archive_file(&[("a.txt", b"alpha")]);
    let output = temp_dir.path().join("restored.txt");

    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    archive.extract_by_name("a.txt", &output).unwrap();
    assert_eq!(std::fs::read(&output).unwrap(), b"alpha");
}

#[test]
fn test_extract_entry_not_found() {
    let (temp_dir, archive_path) = create_test_archive_file(&[("a.txt", b"alpha")]);
    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    let err = archive
        .extract_by_name("nope.txt", temp_dir.path().join("x"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_extractall_creates_directory() {
    let (temp_dir, archive_path) =
        create_test_archive_file(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);
    let output = temp_dir.path().join("nested").join("out");

    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    let result = archive.extract_all(&output).unwrap();
    assert!(result.is_complete());
    assert_eq!(std::fs::read(output.join("b.txt")).unwrap(), b"beta");
}

// =============================================================================
// Remove / Rename / Compact Command Tests
// =============================================================================

#[test]
fn test_remove_missing_name_fails() {
    let (_temp_dir, archive_path) = create_test_archive_file(&[("a.txt", b"alpha")]);
    let mut archive = Archive::open(&archive_path, Mode::Write).unwrap();
    assert!(archive.remove_by_name("b.txt").unwrap_err().is_not_found());
    assert_eq!(archive.len(), 1);
}

#[test]
fn test_removeall_then_compact_shrinks_file() {
    let (_temp_dir, archive_path) =
        create_test_archive_file(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);
    let before = std::fs::metadata(&archive_path).unwrap().len();

    let mut archive = Archive::open(&archive_path, Mode::Write).unwrap();
    let result = archive.remove_all().unwrap();
    assert_eq!(result.removed, 2);
    drop(archive);

    let after = std::fs::metadata(&archive_path).unwrap().len();
    assert!(after < before);
    assert_eq!(after, 24);
}

#[test]
fn test_rename_command() {
    let (_temp_dir, archive_path) = create_test_archive_file(&[("old.txt", b"data")]);
    let mut archive = Archive::open(&archive_path, Mode::Write).unwrap();
    let id = archive.id_of("old.txt").unwrap();
    archive.rename_by_name("old.txt", "new.txt").unwrap();
    drop(archive);

    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    assert_eq!(archive.id_of("new.txt"), Some(id));
    assert_eq!(archive.read(id).unwrap(), b"data");
}

#[test]
fn test_compact_requires_write_mode() {
    let (_temp_dir, archive_path) = create_test_archive_file(&[("a.txt", b"alpha")]);
    let mut archive = Archive::open(&archive_path, Mode::Read).unwrap();
    assert!(matches!(archive.compact(), Err(Error::ReadOnly)));
}
