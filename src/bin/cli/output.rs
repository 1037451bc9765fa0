//! Output formatting for CLI operations.

use std::fmt::Write as _;
use std::path::Path;

use assetpack::{CompactResult, EntryInfo};

const BANNER: &str = "==========================================";

/// Diagnostic line severity, printed as a bracketed prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    Warning,
    Info,
    Fail,
    Skip,
}

impl Status {
    fn prefix(self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Error => "[ERROR]",
            Self::Warning => "[WARNING]",
            Self::Info => "[INFO]",
            Self::Fail => "[FAIL]",
            Self::Skip => "[SKIP]",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Self::Error | Self::Warning)
    }
}

/// Formats one diagnostic line.
pub fn status_line(status: Status, message: impl std::fmt::Display) -> String {
    format!("{} {}", status.prefix(), message)
}

/// Prints one diagnostic line, errors and warnings to stderr.
pub fn report(status: Status, message: impl std::fmt::Display) {
    let line = status_line(status, message);
    if status.to_stderr() {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

/// Prints `(name, reason)` pairs under one status.
pub fn report_failures(status: Status, failures: &[(String, String)]) {
    for (name, reason) in failures {
        report(status, format_args!("{}: {}", name, reason));
    }
}

/// Formats the archive listing.
///
/// With `all`, `entries` comes from a physical scan and each line carries
/// the record state.
pub fn format_list(archive: &Path, entries: &[EntryInfo], all: bool) -> String {
    let mut output = String::new();
    let active = entries.iter().filter(|e| e.is_active()).count();

    let _ = writeln!(output, "{}", BANNER);
    let _ = writeln!(output, "Archive: {}", archive.display());
    if all {
        let _ = writeln!(
            output,
            "Files: {} active, {} deleted",
            active,
            entries.len() - active
        );
    } else {
        let _ = writeln!(output, "Files: {} active", active);
    }
    let _ = writeln!(output, "{}", BANNER);

    for (i, entry) in entries.iter().enumerate() {
        let _ = write!(
            output,
            "[{}] {} (ID: {}, {} bytes, CRC32: 0x{:X})",
            i + 1,
            entry.name,
            entry.id,
            entry.size,
            entry.checksum
        );
        if all {
            output.push_str(if entry.is_active() { " active" } else { " deleted" });
        }
        if entry.is_encrypted() {
            output.push_str(" [encrypted]");
        }
        output.push('\n');
    }

    let _ = writeln!(output, "{}", BANNER);
    output
}

/// Formats a compaction summary.
pub fn format_compact(result: &CompactResult) -> String {
    let mut output = format!(
        "Kept {} records, dropped {} deleted and {} corrupted",
        result.kept, result.deleted_dropped, result.corrupted_dropped
    );
    if result.unverified > 0 {
        let _ = write!(output, ", {} unverified", result.unverified);
    }
    let _ = write!(
        output,
        "; {} -> {} ({} reclaimed)",
        humanize_bytes(result.bytes_before),
        humanize_bytes(result.bytes_after),
        humanize_bytes(result.bytes_reclaimed())
    );
    output
}

/// Formats bytes as human-readable size (e.g., "1.5 MB")
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
