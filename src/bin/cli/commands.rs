//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};

use assetpack::{Archive, ArchiveOptions, Mode};
use walkdir::WalkDir;

use crate::exit_codes::ExitCode;
use crate::output::{self, Status, report, report_failures};

/// Settings shared by every command.
pub struct Settings {
    pub key: Option<String>,
    pub encrypt: bool,
}

impl Settings {
    fn options(&self, mode: Mode) -> ArchiveOptions {
        let options = ArchiveOptions::new().mode(mode).encryption(self.encrypt);
        match &self.key {
            Some(key) => options.key(key),
            None => options,
        }
    }
}

/// Expands directories to the regular files directly inside them.
///
/// Missing paths and unreadable directories are reported and skipped.
pub fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            match list_directory(path) {
                Ok(files) if !files.is_empty() => {
                    report(
                        Status::Info,
                        format_args!(
                            "Collected {} files from directory: {}",
                            files.len(),
                            path.display()
                        ),
                    );
                    sources.extend(files);
                }
                Ok(_) => report(
                    Status::Warning,
                    format_args!("Directory is empty: {}", path.display()),
                ),
                Err(e) => report(
                    Status::Warning,
                    format_args!("Cannot read directory {}: {}", path.display(), e),
                ),
            }
        } else if path.exists() {
            sources.push(path.clone());
        } else {
            report(
                Status::Warning,
                format_args!("File not found (skipped): {}", path.display()),
            );
        }
    }
    sources
}

fn list_directory(dir: &Path) -> walkdir::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn open_archive(path: &Path, settings: &Settings, mode: Mode) -> Result<Archive, ExitCode> {
    Archive::open_with(path, settings.options(mode)).map_err(|e| {
        report(
            Status::Error,
            format_args!("Failed to open archive {}: {}", path.display(), e),
        );
        ExitCode::Failure
    })
}

/// Create command implementation
pub fn create(archive_path: &Path, paths: &[PathBuf], settings: &Settings) -> ExitCode {
    let sources = collect_sources(paths);

    let (_archive, result) =
        match Archive::create(archive_path, &sources, settings.options(Mode::Write)) {
            Ok(created) => created,
            Err(e) => {
                report(
                    Status::Error,
                    format_args!("Failed to create archive: {}", e),
                );
                return ExitCode::Failure;
            }
        };

    report_failures(Status::Skip, &result.failures);
    if result.added.is_empty() {
        report(
            Status::Ok,
            format_args!("Empty archive created: {}", archive_path.display()),
        );
    } else {
        report(
            Status::Ok,
            format_args!(
                "Archive created: {} ({} files)",
                archive_path.display(),
                result.added.len()
            ),
        );
    }
    ExitCode::from_outcome(result.is_complete())
}

/// Add command implementation
pub fn add(archive_path: &Path, paths: &[PathBuf], settings: &Settings) -> ExitCode {
    let sources = collect_sources(paths);
    let mut archive = match open_archive(archive_path, settings, Mode::Write) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = match archive.add_files(&sources) {
        Ok(result) => result,
        Err(e) => {
            report(Status::Error, format_args!("Failed to add files: {}", e));
            return ExitCode::Failure;
        }
    };

    for entry in &result.added {
        report(
            Status::Ok,
            format_args!("Added: {} (ID: {})", entry.name, entry.id),
        );
    }
    report_failures(Status::Error, &result.failures);

    if result.is_complete() && sources.len() == paths.len() {
        report(Status::Ok, "All files added");
    }
    ExitCode::from_outcome(result.is_complete())
}

/// List command implementation
pub fn list(archive_path: &Path, all: bool, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Read) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let entries = if all { archive.scan() } else { archive.list() };
    match entries {
        Ok(entries) => {
            print!("{}", output::format_list(archive_path, &entries, all));
            ExitCode::Success
        }
        Err(e) => {
            report(Status::Error, format_args!("Failed to list archive: {}", e));
            ExitCode::Failure
        }
    }
}

/// Extract command implementation
pub fn extract(archive_path: &Path, name: &str, output_path: &Path, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Read) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match archive.extract_by_name(name, output_path) {
        Ok(_) => {
            report(
                Status::Ok,
                format_args!("Extracted: {} -> {}", name, output_path.display()),
            );
            ExitCode::Success
        }
        Err(e) => {
            report(
                Status::Error,
                format_args!("Failed to extract {}: {}", name, e),
            );
            ExitCode::Failure
        }
    }
}

/// Extractall command implementation
pub fn extract_all(archive_path: &Path, output_dir: &Path, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Read) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = match archive.extract_all(output_dir) {
        Ok(result) => result,
        Err(e) => {
            report(
                Status::Error,
                format_args!("Failed to extract all files: {}", e),
            );
            return ExitCode::Failure;
        }
    };

    report_failures(Status::Skip, &result.failures);
    if result.is_complete() {
        report(
            Status::Ok,
            format_args!("All files extracted to: {}", output_dir.display()),
        );
    } else {
        report(
            Status::Error,
            format_args!(
                "Extracted {} of {} files",
                result.extracted.len(),
                result.extracted.len() + result.failures.len()
            ),
        );
    }
    ExitCode::from_outcome(result.is_complete())
}

/// Validate command implementation
pub fn validate(archive_path: &Path, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Read) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = match archive.validate() {
        Ok(result) => result,
        Err(e) => {
            report(Status::Error, format_args!("Validation aborted: {}", e));
            return ExitCode::Failure;
        }
    };

    for name in &result.passed {
        report(Status::Ok, name);
    }
    report_failures(Status::Fail, &result.failures);

    if result.is_valid() {
        report(
            Status::Ok,
            format_args!("Archive validated (CRC32 OK, {} files)", result.checked()),
        );
        ExitCode::Success
    } else {
        report(
            Status::Error,
            format_args!(
                "Archive validation failed ({} of {} files)",
                result.failures.len(),
                result.checked()
            ),
        );
        ExitCode::Failure
    }
}

/// Remove command implementation
pub fn remove(archive_path: &Path, name: &str, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Write) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match archive.remove_by_name(name) {
        Ok(_) => {
            report(
                Status::Ok,
                format_args!("File removed (soft delete): {}", name),
            );
            ExitCode::Success
        }
        Err(e) => {
            report(Status::Error, format_args!("Failed to remove {}: {}", name, e));
            ExitCode::Failure
        }
    }
}

/// Removeall command implementation
pub fn remove_all(archive_path: &Path, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Write) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match archive.remove_all() {
        Ok(result) => {
            report(
                Status::Ok,
                format_args!(
                    "Archive emptied ({} files removed, {} reclaimed)",
                    result.removed,
                    output::humanize_bytes(result.compact.bytes_reclaimed())
                ),
            );
            ExitCode::Success
        }
        Err(e) => {
            report(
                Status::Error,
                format_args!("Failed to remove all files: {}", e),
            );
            ExitCode::Failure
        }
    }
}

/// Rename command implementation
pub fn rename(archive_path: &Path, old_name: &str, new_name: &str, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Write) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match archive.rename_by_name(old_name, new_name) {
        Ok(()) => {
            report(
                Status::Ok,
                format_args!("File renamed: {} -> {}", old_name, new_name),
            );
            ExitCode::Success
        }
        Err(e) => {
            report(Status::Error, format_args!("Failed to rename file: {}", e));
            ExitCode::Failure
        }
    }
}

/// Compact command implementation
pub fn compact(archive_path: &Path, settings: &Settings) -> ExitCode {
    let mut archive = match open_archive(archive_path, settings, Mode::Write) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match archive.compact() {
        Ok(result) => {
            report_failures(Status::Skip, &result.skipped);
            report(Status::Info, output::format_compact(&result));
            report(Status::Ok, "Archive compacted");
            ExitCode::Success
        }
        Err(e) => {
            report(
                Status::Error,
                format_args!("Failed to compact archive: {}", e),
            );
            ExitCode::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plain() -> Settings {
        Settings {
            key: None,
            encrypt: false,
        }
    }

    #[test]
    fn test_collect_sources_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.txt"), b"c").unwrap();

        let sources = collect_sources(&[dir.path().to_path_buf(), dir.path().join("missing")]);
        assert_eq!(
            sources,
            vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
        );
    }

    #[test]
    fn test_command_sequence() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("logo.png");
        std::fs::write(&source, b"png bytes").unwrap();
        let archive = dir.path().join("game.asset");
        let settings = plain();

        assert_eq!(create(&archive, &[source.clone()], &settings), ExitCode::Success);
        assert_eq!(add(&archive, &[source], &settings), ExitCode::Success);
        assert_eq!(validate(&archive, &settings), ExitCode::Success);
        assert_eq!(
            rename(&archive, "logo(1).png", "icon.png", &settings),
            ExitCode::Success
        );
        assert_eq!(remove(&archive, "logo.png", &settings), ExitCode::Success);
        assert_eq!(remove(&archive, "logo.png", &settings), ExitCode::Failure);
        assert_eq!(compact(&archive, &settings), ExitCode::Success);

        let out = dir.path().join("icon.out");
        assert_eq!(extract(&archive, "icon.png", &out, &settings), ExitCode::Success);
        assert_eq!(std::fs::read(&out).unwrap(), b"png bytes");
        assert_eq!(remove_all(&archive, &settings), ExitCode::Success);
        assert_eq!(list(&archive, false, &settings), ExitCode::Success);
    }

    #[test]
    fn test_missing_archive_fails_in_read_mode() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("none.asset");
        assert_eq!(validate(&archive, &plain()), ExitCode::Failure);
        assert!(!archive.exists());
    }
}
