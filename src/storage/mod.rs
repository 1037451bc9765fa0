//! Seekable byte storage the archive engine reads and writes through.
//!
//! [`Storage`] is the seam between the archive format and where its bytes
//! live. Two backends are provided:
//!
//! - [`FileStorage`] over a file on disk
//! - [`MemoryStorage`] over an in-memory buffer
//!
//! Besides plain `Read + Write + Seek`, a storage knows how to replace its
//! whole contents with [`Storage::rewrite`], which rebuild and compaction
//! use to produce a fresh copy of the archive from the old one.

mod file;
mod memory;

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::Result;

/// Read side of a rewrite: the old contents.
pub trait Source: Read + Seek {}

impl<T: Read + Seek + ?Sized> Source for T {}

/// Write side of a rewrite: the new contents.
pub trait Sink: Write + Seek {}

impl<T: Write + Seek + ?Sized> Sink for T {}

/// A seekable byte store that can also replace its contents wholesale.
pub trait Storage: Read + Write + Seek {
    /// Returns the current length in bytes, preserving the position.
    fn size(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        if pos != end {
            self.seek(SeekFrom::Start(pos))?;
        }
        Ok(end)
    }

    /// Replaces the whole contents with the bytes `f` writes.
    ///
    /// `f` reads the old contents from the [`Source`] and writes the new
    /// contents to the [`Sink`], both starting at position 0. If `f` fails,
    /// the old contents are left in place. After a successful rewrite the
    /// storage holds only the new bytes and its position is unspecified.
    fn rewrite<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Source, &mut dyn Sink) -> Result<T>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }

    fn rewrite<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Source, &mut dyn Sink) -> Result<T>,
    {
        (**self).rewrite(f)
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }

    fn rewrite<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Source, &mut dyn Sink) -> Result<T>,
    {
        self.set_position(0);
        let mut fresh = Cursor::new(Vec::new());
        let value = f(self, &mut fresh)?;
        fresh.set_position(0);
        *self = fresh;
        Ok(value)
    }
}
