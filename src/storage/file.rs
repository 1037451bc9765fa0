//! File-backed storage.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{Sink, Source, Storage};
use crate::{Error, Mode, Result};

/// Storage over a file on disk.
///
/// Rewrites go through a temporary file in the same directory, which is
/// flushed to disk and then renamed over the original. A crash during a
/// rewrite leaves either the old or the new file in place.
#[derive(Debug)]
pub struct FileStorage {
    file: File,
    path: PathBuf,
    mode: Mode,
}

impl FileStorage {
    /// Opens `path` for reading or writing.
    ///
    /// In [`Mode::Write`] the file is created if missing and never
    /// truncated.
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        let path = path.as_ref();
        let file = open_file(path, mode)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode,
        })
    }

    /// Returns the path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the mode the file was opened in.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Flushes file contents and metadata to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().map_err(Error::Io)
    }

    fn temp_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

fn open_file(path: &Path, mode: Mode) -> Result<File> {
    let file = match mode {
        Mode::Read => File::open(path),
        Mode::Write => OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path),
    };
    file.map_err(Error::Io)
}

impl Read for FileStorage {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for FileStorage {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for FileStorage {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl Storage for FileStorage {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn rewrite<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Source, &mut dyn Sink) -> Result<T>,
    {
        let temp = tempfile::Builder::new()
            .prefix(".assetpack-")
            .suffix(".tmp")
            .tempfile_in(self.temp_dir())?;
        log::debug!(
            "rewriting {} through {}",
            self.path.display(),
            temp.path().display()
        );

        self.file.seek(SeekFrom::Start(0))?;
        let mut writer = BufWriter::new(temp);
        let value = f(&mut self.file, &mut writer)?;
        let temp = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        self.file = open_file(&self.path, self.mode)?;
        Ok(value)
    }
}
